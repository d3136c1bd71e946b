//! Store and control loop driven concurrently by a scripted engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use botomy_bridge::{ControlLoop, Error, Featurizer, GymEnv, RendezvousStore};
use botomy_core::model::{OwnPlayer, Player};
use botomy_core::{Action, ActionBatch, Command, GameState, Position, ResetOptions, Snapshot};

const DEADLINE: Duration = Duration::from_secs(5);

fn snap(state: GameState, tick: i64, score: i64) -> Snapshot {
    let mut s = Snapshot::waiting();
    s.game_info.state = state;
    s.game_info.time_remaining_s = tick;
    s.own_player = Some(OwnPlayer {
        player: Player {
            score,
            position: Position::new(0.0, 0.0),
            ..Default::default()
        },
        ..Default::default()
    });
    s
}

/// Engine side of the reset handshake: poll `/reset` and post STARTING
/// until the control loop has its first observation.
async fn complete_reset(
    store: &Arc<RendezvousStore>,
    seed: Option<i64>,
) -> (ControlLoop, Arc<Snapshot>) {
    let task = {
        let store = Arc::clone(store);
        tokio::spawn(async move {
            let mut ctl = ControlLoop::new(store);
            let first = ctl.reset(seed, ResetOptions::new()).await?;
            Ok::<_, Error>((ctl, first))
        })
    };
    while !task.is_finished() {
        store.poll_reset().await;
        store.ingest(snap(GameState::Starting, 0, 0)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    task.await.unwrap().unwrap()
}

#[tokio::test]
async fn idle_polls_return_empty_and_leave_store_alone() {
    let store = RendezvousStore::new(0, None).unwrap();
    for i in 0..10 {
        let batch = store.ingest(snap(GameState::Started, i, 100)).await;
        assert!(batch.is_empty());
    }
    let current = store.current_snapshot().await;
    assert_eq!(current.state(), GameState::Waiting);
    assert!(current.is_empty());
}

#[tokio::test]
async fn reset_sentinel_holds_until_engine_posts() {
    let store = RendezvousStore::new(0, None).unwrap();
    store.request_reset(Some(10), ResetOptions::new()).await;
    assert_eq!(store.current_snapshot().await.state(), GameState::Waiting);

    // Not armed until the engine reads the reset.
    store.ingest(snap(GameState::Started, 1, 0)).await;
    assert_eq!(store.current_snapshot().await.state(), GameState::Waiting);

    let req = store.poll_reset().await;
    assert!(req.should_reset);
    assert_eq!(req.seed, Some(10));
    assert!(!store.poll_reset().await.should_reset);

    store.ingest(snap(GameState::Starting, 2, 0)).await;
    assert_eq!(store.current_snapshot().await.state(), GameState::Starting);
}

#[tokio::test]
async fn step_delivers_batch_once_and_returns_following_snapshot() {
    tokio::time::timeout(DEADLINE, async {
        let store = Arc::new(RendezvousStore::new(0, None).unwrap());
        let (mut ctl, first) = complete_reset(&store, None).await;
        assert_eq!(first.state(), GameState::Starting);

        let move_right = ActionBatch(vec![Command::MoveTo(Position::new(500.0, 0.0))]);
        let step = {
            let batch = move_right.clone();
            tokio::spawn(async move { ctl.step(batch).await })
        };

        let mut delivered = Vec::new();
        let mut tick = 0;
        let mut delivered_at = None;
        while !step.is_finished() {
            tick += 1;
            let batch = store.ingest(snap(GameState::Started, tick, 10)).await;
            if !batch.is_empty() {
                delivered_at = Some(tick);
                delivered.push(batch);
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let next = step.await.unwrap().unwrap();

        assert_eq!(delivered, vec![move_right]);
        let delivered_at = delivered_at.unwrap();
        assert!(next.game_info.time_remaining_s > delivered_at);

        for _ in 0..5 {
            tick += 1;
            assert!(store.ingest(snap(GameState::Started, tick, 10)).await.is_empty());
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn reset_mid_episode_skips_stale_snapshots() {
    tokio::time::timeout(DEADLINE, async {
        let store = Arc::new(RendezvousStore::new(0, None).unwrap());
        let (ctl, _) = complete_reset(&store, None).await;

        let mut options = ResetOptions::new();
        options.insert("round_length".into(), 2.into());
        let reset = tokio::spawn(async move {
            let mut ctl = ctl;
            ctl.reset(Some(10), options).await
        });

        // Engine is still finishing the old round when it notices the reset.
        let script = [
            GameState::Started,
            GameState::Ended,
            GameState::Ended,
            GameState::Waiting,
            GameState::Waiting,
        ];
        let mut reset_seen = false;
        let mut tick = 0;
        for state in script {
            tick += 1;
            if !reset_seen {
                let req = store.poll_reset().await;
                if req.should_reset {
                    assert_eq!(req.seed, Some(10));
                    assert_eq!(req.options.get("round_length"), Some(&2.into()));
                    reset_seen = true;
                }
            }
            store.ingest(snap(state, tick, 0)).await;
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert!(!reset.is_finished(), "returned a non-STARTING snapshot");
        }

        let starting_tick = tick + 1;
        while !reset.is_finished() {
            store.ingest(snap(GameState::Starting, starting_tick, 0)).await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let first = reset.await.unwrap().unwrap();
        assert_eq!(first.state(), GameState::Starting);
        assert_eq!(first.game_info.time_remaining_s, starting_tick);
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshots_are_consumed_exactly_once_in_order() {
    tokio::time::timeout(DEADLINE, async {
        let store = Arc::new(RendezvousStore::new(0, None).unwrap());
        let (mut ctl, first) = complete_reset(&store, None).await;

        let stop = Arc::new(AtomicBool::new(false));
        let engine = {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                let mut accepted = Vec::new();
                let mut tick = 0i64;
                while !stop.load(Ordering::Acquire) {
                    tick += 1;
                    store.ingest(snap(GameState::Started, tick, tick)).await;
                    if store.current_snapshot().await.game_info.time_remaining_s == tick {
                        accepted.push(tick);
                    }
                    tokio::task::yield_now().await;
                }
                accepted
            })
        };

        let mut received = Vec::new();
        for _ in 0..50 {
            let s = ctl.step(ActionBatch(vec![Command::Attack])).await.unwrap();
            received.push(s.game_info.time_remaining_s);
        }
        stop.store(true, Ordering::Release);
        let accepted = engine.await.unwrap();

        assert_eq!(first.game_info.time_remaining_s, 0);
        assert_eq!(received.len(), 50);
        assert!(received.windows(2).all(|w| w[0] < w[1]), "{received:?}");
        assert_eq!(&accepted[..received.len()], &received[..]);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn publishing_twice_without_consuming_fails_fast() {
    let store = RendezvousStore::new(0, None).unwrap();
    store
        .publish_actions(ActionBatch(vec![Command::Attack]))
        .await
        .unwrap();
    let err = store
        .publish_actions(ActionBatch(vec![Command::Shield]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ContractViolation(_)));

    // The first batch is still the one delivered.
    assert_eq!(
        store.take_pending_actions().await,
        ActionBatch(vec![Command::Attack])
    );
}

#[tokio::test]
async fn step_times_out_when_engine_goes_quiet() {
    let store = Arc::new(RendezvousStore::new(0, Some(Duration::from_millis(30))).unwrap());
    let mut ctl = ControlLoop::new(Arc::clone(&store));
    let err = ctl.step(ActionBatch(vec![Command::Attack])).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

struct ScoreAndTick;

impl Featurizer for ScoreAndTick {
    fn dim(&self) -> usize {
        2
    }

    fn featurize(&self, snapshot: &Snapshot) -> Vec<f32> {
        vec![
            snapshot.own_score() as f32,
            snapshot.game_info.time_remaining_s as f32,
        ]
    }
}

#[tokio::test]
async fn gym_env_reports_termination() {
    tokio::time::timeout(DEADLINE, async {
        let store = Arc::new(RendezvousStore::new(0, None).unwrap());
        let (ctl, first) = complete_reset(&store, None).await;
        assert_eq!(first.state(), GameState::Starting);

        let mut env = GymEnv::new(ctl, ScoreAndTick);
        assert_eq!(env.observation_dim(), 2);
        assert_eq!(env.action_count(), Action::COUNT);

        let step = tokio::spawn(async move {
            let t = env.step(Action::Attack).await?;
            Ok::<_, Error>((env, t))
        });
        let mut tick = 0;
        while !step.is_finished() {
            tick += 1;
            store.ingest(snap(GameState::Ended, tick, 42)).await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let (env, t) = step.await.unwrap().unwrap();
        assert!(t.terminated);
        assert_eq!(t.observation[0], 42.0);
        assert_eq!(t.reward, 42);
        assert_eq!(env.control().steps(), 1);
    })
    .await
    .unwrap();
}
