//! Runtime wiring: events in, replies and owner alerts out, scheduled jobs
//! between messages.

use std::sync::Arc;
use std::time::{Duration, Instant};

use resbot_core::config::BotCfg;
use resbot_core::io::input::{self, InboundEvent, InputSender};
use resbot_core::io::output::OutputReceiver;
use resbot_core::router::{ResponseRouter, replies};
use resbot_core::runtime::{Job, Runtime};
use resbot_core::store::ContentStore;
use resbot_core::types::Message;
use resbot_llm::provider::MockProvider;

const OWNER: &str = "6281100000000";
const CUSTOMER: &str = "6281200000001";

async fn runtime(cfg: BotCfg) -> (Runtime, InputSender, OutputReceiver) {
    let store = ContentStore::in_memory("data").await.unwrap();
    let router = ResponseRouter::new(cfg, store, Arc::new(MockProvider::new("ok kak"))).await.unwrap();
    Runtime::new(router)
}

fn cfg() -> BotCfg {
    BotCfg { rate_limit_ms: 0, ..BotCfg::with_owner(OWNER) }
}

#[tokio::test]
async fn batched_event_yields_reply_per_message() {
    let (mut rt, _tx, mut out) = runtime(cfg()).await;
    let event = InboundEvent {
        messages: vec![
            Message::text(format!("{CUSTOMER}@s.whatsapp.net"), "menu"),
            Message::text(format!("{CUSTOMER}@s.whatsapp.net"), "a"),
        ],
    };
    rt.handle_event(event).await;

    let first = out.recv().await.unwrap();
    assert_eq!(first.chat_id, format!("{CUSTOMER}@s.whatsapp.net"));
    assert!(first.text.contains("Menu"), "{}", first.text);
    let second = out.recv().await.unwrap();
    assert_eq!(second.text, replies::CLARIFY);
}

#[tokio::test]
async fn monitoring_job_alerts_the_owner() {
    let (mut rt, _tx, mut out) = runtime(cfg()).await;
    rt.handle_event(InboundEvent::single(Message::text(format!("{OWNER}@s.whatsapp.net"), "emergency stop")))
        .await;
    let _ack = out.recv().await.unwrap();

    let later = Instant::now() + Duration::from_secs(rt.router().cfg().cleanup_interval_secs + 1);
    let ran = rt.run_due_jobs(later).await;
    assert!(ran.contains(&Job::Monitoring));
    assert!(ran.contains(&Job::Cleanup));
    assert!(!ran.contains(&Job::Backup));

    let alert = out.recv().await.unwrap();
    assert_eq!(alert.chat_id, format!("{OWNER}@s.whatsapp.net"));
    assert!(alert.text.contains("Emergency stop"), "{}", alert.text);

    // The same condition is not re-announced on the next pass.
    let again = later + Duration::from_secs(rt.router().cfg().cleanup_interval_secs + 1);
    rt.run_due_jobs(again).await;
    assert!(out.try_recv().is_err());
}

#[tokio::test]
async fn disabled_jobs_never_run() {
    let (mut rt, _tx, _out) = runtime(BotCfg { backup_interval_secs: 0, ..cfg() }).await;
    rt.scheduler_mut().set_enabled(Job::Cleanup, false);
    let far = Instant::now() + Duration::from_secs(7 * 24 * 3600);
    let ran = rt.run_due_jobs(far).await;
    assert!(!ran.contains(&Job::Cleanup));
    assert!(!ran.contains(&Job::Backup));
    assert_eq!(ran, vec![Job::Monitoring]);
}

#[tokio::test]
async fn run_exits_when_senders_drop() {
    let (mut rt, tx, mut out) = runtime(cfg()).await;
    input::submit_text(&tx, format!("{CUSTOMER}@s.whatsapp.net"), "promo").await.unwrap();
    drop(tx);
    tokio::time::timeout(Duration::from_secs(5), rt.run()).await.unwrap();
    assert!(out.recv().await.is_some());
}
