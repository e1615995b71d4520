//! Inbound routing with one actor task per user.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{Inbound, MessageSink, Outbound};
use crate::core::UserId;
use crate::features::conversation::Conversation;

/// Actors with nothing queued are stopped after this long without input.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Router side of one user actor.
struct UserQueue {
    tx: mpsc::UnboundedSender<String>,
    pending: Arc<AtomicUsize>,
    last_seen: Instant,
}

impl UserQueue {
    fn is_idle(&self, now: Instant, idle: Duration) -> bool {
        self.pending.load(Ordering::SeqCst) == 0 && now.duration_since(self.last_seen) >= idle
    }
}

/// Routes inbound messages to per-user actors.
///
/// One user's messages are handled in arrival order; different users are
/// handled concurrently. A slow user never holds up routing for others.
/// Conversation state lives outside the actors, so a reaped actor is simply
/// respawned on the user's next message.
pub struct Router {
    conversation: Arc<Conversation>,
    sink: Arc<dyn MessageSink>,
    idle_timeout: Duration,
}

impl Router {
    /// Create a router.
    pub fn new(conversation: Arc<Conversation>, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            conversation,
            sink,
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    /// Stop idle actors after `idle` instead of [`IDLE_TIMEOUT`].
    #[must_use]
    pub const fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_timeout = idle;
        self
    }

    /// Consume `inbound` until it closes, then wait for every actor to drain.
    pub async fn run(self, mut inbound: mpsc::Receiver<Inbound>) {
        let mut actors: HashMap<UserId, UserQueue> = HashMap::new();
        let mut tasks = JoinSet::new();
        let mut sweep = time::interval(SWEEP_INTERVAL.min(self.idle_timeout));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = inbound.recv() => {
                    let Some(Inbound { user, text }) = message else {
                        break;
                    };
                    self.route(&mut actors, &mut tasks, user, text);
                },
                _ = sweep.tick() => {
                    let reaped = reap_idle(&mut actors, Instant::now(), self.idle_timeout);
                    if reaped > 0 {
                        debug!(reaped, active = actors.len(), "stopped idle user actors");
                    }
                    while let Some(result) = tasks.try_join_next() {
                        log_exit(result);
                    }
                },
            }
        }

        info!(users = actors.len(), "inbound closed, draining user actors");
        drop(actors);

        while let Some(result) = tasks.join_next().await {
            log_exit(result);
        }
    }

    fn route(
        &self,
        actors: &mut HashMap<UserId, UserQueue>,
        tasks: &mut JoinSet<()>,
        user: UserId,
        text: String,
    ) {
        let queue = actors.entry(user.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let pending = Arc::new(AtomicUsize::new(0));
            tasks.spawn(user_actor(
                user.clone(),
                rx,
                Arc::clone(&pending),
                Arc::clone(&self.conversation),
                Arc::clone(&self.sink),
            ));
            debug!(%user, "spawned user actor");
            UserQueue {
                tx,
                pending,
                last_seen: Instant::now(),
            }
        });

        queue.pending.fetch_add(1, Ordering::SeqCst);
        queue.last_seen = Instant::now();
        if queue.tx.send(text).is_err() {
            warn!(%user, "user actor gone, message dropped");
            actors.remove(&user);
        }
    }
}

/// Drop the queues of actors idle for at least `idle`. Their actors exit once
/// they see the closed channel. Returns how many were dropped.
fn reap_idle(actors: &mut HashMap<UserId, UserQueue>, now: Instant, idle: Duration) -> usize {
    let before = actors.len();
    actors.retain(|_, queue| !queue.is_idle(now, idle));
    before - actors.len()
}

fn log_exit(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        warn!(error = %e, "user actor failed");
    }
}

async fn user_actor(
    user: UserId,
    mut rx: mpsc::UnboundedReceiver<String>,
    pending: Arc<AtomicUsize>,
    conversation: Arc<Conversation>,
    sink: Arc<dyn MessageSink>,
) {
    while let Some(text) = rx.recv().await {
        let reply = conversation.handle(&user, &text).await;
        let outbound = Outbound {
            user: user.clone(),
            text: reply.text,
            keyboard: reply.keyboard,
        };

        if let Err(e) = sink.send(outbound).await {
            warn!(%user, error = %e, "reply not delivered");
        }
        pending.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(%user, "user actor stopped");
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::FocusError;
    use crate::features::advice::Advisor;
    use crate::gateway::testing::{conversation, conversation_with, RecordingSink};

    struct SlowAdvisor;

    #[async_trait]
    impl Advisor for SlowAdvisor {
        async fn advise(&self, _prompt: &str) -> Result<String, FocusError> {
            time::sleep(Duration::from_secs(30)).await;
            Ok("take a break".to_string())
        }
    }

    fn inbound(user: &str, text: &str) -> Inbound {
        Inbound {
            user: UserId::new(user),
            text: text.to_string(),
        }
    }

    fn queue(pending: usize, last_seen: Instant) -> (UserQueue, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = UserQueue {
            tx,
            pending: Arc::new(AtomicUsize::new(pending)),
            last_seen,
        };
        (queue, rx)
    }

    async fn wait_for_replies(sink: &RecordingSink, user: &UserId, count: usize) {
        for _ in 0..100 {
            if sink.texts_for(user).len() >= count {
                return;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_replies_keep_per_user_order() {
        let sink = Arc::new(RecordingSink::default());
        let router = Router::new(conversation(sink.clone()), sink.clone());
        let (tx, rx) = mpsc::channel(16);
        let running = tokio::spawn(router.run(rx));

        for message in [
            inbound("a", "📝 Tasks"),
            inbound("b", "/start"),
            inbound("a", "➕ Add"),
            inbound("a", "write report"),
            inbound("b", "nonsense"),
        ] {
            tx.send(message).await.unwrap();
        }
        drop(tx);
        running.await.unwrap();

        let a = sink.texts_for(&UserId::new("a"));
        assert_eq!(a.len(), 3);
        assert!(a[0].starts_with("📋 Your tasks:"));
        assert!(a[1].starts_with("Enter the task text"));
        assert_eq!(a[2], "✅ Task added.");

        let b = sink.texts_for(&UserId::new("b"));
        assert_eq!(b, vec!["👋 Hi! Main menu:", "🤖 Unknown command. Send /start"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backlogged_user_does_not_stall_others() {
        let sink = Arc::new(RecordingSink::default());
        let conversation = conversation_with(sink.clone(), Arc::new(SlowAdvisor));
        let router = Router::new(conversation, sink.clone());
        let (tx, rx) = mpsc::channel(64);
        let running = tokio::spawn(router.run(rx));

        for _ in 0..40 {
            tx.send(inbound("a", "💡 Advice")).await.unwrap();
        }
        tx.send(inbound("b", "/start")).await.unwrap();

        let b = UserId::new("b");
        wait_for_replies(&sink, &b, 1).await;
        assert_eq!(sink.texts_for(&b), vec!["👋 Hi! Main menu:"]);
        assert!(sink.texts_for(&UserId::new("a")).is_empty());

        running.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_actor_is_respawned_with_state_intact() {
        let sink = Arc::new(RecordingSink::default());
        let router = Router::new(conversation(sink.clone()), sink.clone())
            .with_idle_timeout(Duration::from_secs(5 * 60));
        let (tx, rx) = mpsc::channel(16);
        let running = tokio::spawn(router.run(rx));
        let a = UserId::new("a");

        tx.send(inbound("a", "📝 Tasks")).await.unwrap();
        tx.send(inbound("a", "➕ Add")).await.unwrap();
        wait_for_replies(&sink, &a, 2).await;

        time::sleep(Duration::from_secs(10 * 60)).await;

        tx.send(inbound("a", "write report")).await.unwrap();
        drop(tx);
        running.await.unwrap();

        let replies = sink.texts_for(&a);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[2], "✅ Task added.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reap_idle_keeps_busy_and_recent_actors() {
        let idle = Duration::from_secs(60);
        let start = Instant::now();
        time::advance(Duration::from_secs(120)).await;
        let now = Instant::now();

        let (stale, mut stale_rx) = queue(0, start);
        let (busy, _busy_rx) = queue(2, start);
        let (recent, _recent_rx) = queue(0, now);
        let mut actors = HashMap::from([
            (UserId::new("stale"), stale),
            (UserId::new("busy"), busy),
            (UserId::new("recent"), recent),
        ]);

        assert_eq!(reap_idle(&mut actors, now, idle), 1);
        assert!(!actors.contains_key(&UserId::new("stale")));
        assert!(actors.contains_key(&UserId::new("busy")));
        assert!(actors.contains_key(&UserId::new("recent")));
        assert!(stale_rx.recv().await.is_none());
    }
}
