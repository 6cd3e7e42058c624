//! End-to-end routing tests.
//!
//! Each test builds a router over an in-memory store seeded with a small
//! catalog and a mock language model, then drives it with WhatsApp-shaped
//! messages: Message → gate → cache → cascade → handler → law filter.

use std::sync::Arc;

use resbot_core::config::BotCfg;
use resbot_core::laws::{ActionKind, BotLaws};
use resbot_core::router::{BotReply, ResponseRouter, RouteKind, replies};
use resbot_core::store::ContentStore;
use resbot_core::types::{
    ClaimLog, FaqEntry, KnowledgeEntry, KnowledgeSource, Law, LearningEvent, LearningEventKind, Message,
    ProductSheet, PromoEntry, SopEntry, StockRecord,
};
use resbot_llm::provider::{LlmError, MockProvider};
use uuid::Uuid;

const OWNER: &str = "6281100000000";
const CUSTOMER: &str = "6281200000001";
const MODERATOR: &str = "6281300000002";

const LLM_ANSWER: &str =
    "Untuk restock YouTube Premium biasanya setiap hari Senin kak, silakan cek lagi nanti ya. Kami akan kabari jika stok sudah ada.";

fn jid(number: &str) -> String {
    format!("{number}@s.whatsapp.net")
}

fn cfg() -> BotCfg {
    BotCfg { rate_limit_ms: 0, spam_max_messages: 1000, ..BotCfg::with_owner(OWNER) }
}

async fn seeded_store() -> ContentStore {
    let store = ContentStore::in_memory("data").await.unwrap();
    store
        .upsert(&ProductSheet {
            id: Uuid::new_v4(),
            name: "netflix".into(),
            body: "Netflix Premium 1 bulan Rp25.000\nPrivate profile, garansi 30 hari.".into(),
            aliases: vec!["nf".into()],
        })
        .await
        .unwrap();
    store
        .upsert(&FaqEntry {
            id: Uuid::new_v4(),
            question: "berapa lama proses pengiriman akun".into(),
            answer: "Akun dikirim 5-10 menit setelah pembayaran dikonfirmasi kak.".into(),
            keywords: vec!["pengiriman".into(), "dikirim".into()],
        })
        .await
        .unwrap();
    store
        .upsert(&SopEntry {
            id: Uuid::new_v4(),
            title: "prosedur klaim garansi".into(),
            content: "Kirim nomor order dan tangkapan layar ke admin ya kak.".into(),
            keywords: vec!["klaim garansi".into()],
        })
        .await
        .unwrap();
    store
        .upsert(&StockRecord {
            id: Uuid::new_v4(),
            product: "netflix".into(),
            quantity: 3,
            updated_at: chrono::Utc::now(),
        })
        .await
        .unwrap();
    store
}

async fn router_with(provider: MockProvider, cfg: BotCfg) -> ResponseRouter {
    ResponseRouter::new(cfg, seeded_store().await, Arc::new(provider)).await.unwrap()
}

async fn router() -> ResponseRouter {
    router_with(MockProvider::new(LLM_ANSWER), cfg()).await
}

async fn say(router: &mut ResponseRouter, from: &str, text: &str) -> BotReply {
    router.route_message(&Message::text(jid(from), text)).await.expect("a reply")
}

// ── Spec scenarios ─────────────────────────────────────────────

#[tokio::test]
async fn product_question_is_answered_from_catalog() {
    let mut router = router().await;
    let reply = say(&mut router, CUSTOMER, "netflix harga berapa").await;

    assert_eq!(reply.route, Some(RouteKind::Hybrid));
    assert!(reply.text.contains("Rp25.000"), "{}", reply.text);
    assert!(reply.text.contains("Stok tersedia: 3"));
    assert_eq!(reply.chat_id, jid(CUSTOMER));
    assert!(reply.blocked.is_none());
    assert_eq!(router.analytics().top_products(1), vec![("netflix", 1)]);
}

#[tokio::test]
async fn first_greeting_uses_a_template() {
    let mut router = router().await;
    let reply = say(&mut router, CUSTOMER, "halo").await;

    assert_eq!(reply.route, Some(RouteKind::System));
    assert!(replies::GREETINGS.contains(&reply.text.as_str()), "{}", reply.text);

    // Same session: the returning greeting.
    let again = say(&mut router, CUSTOMER, "Halo").await;
    assert_eq!(again.text, replies::GREETING_RETURNING);
}

#[tokio::test]
async fn emergency_stop_blocks_until_resume() {
    let mut router = router().await;

    // 1. Owner pulls the brake.
    let stop = say(&mut router, OWNER, "emergency stop").await;
    assert_eq!(stop.route, Some(RouteKind::Law));
    assert!(router.laws().is_emergency_stopped());

    // 2. Customer replies are replaced with the maintenance text.
    let blocked = say(&mut router, CUSTOMER, "netflix harga berapa").await;
    assert_eq!(blocked.text, replies::MAINTENANCE);
    assert_eq!(blocked.blocked.as_ref().map(|v| v.law), Some(Law::EmergencyStopActive));

    // 3. Owner law commands still answer.
    let status = say(&mut router, OWNER, "law status").await;
    assert!(status.text.contains("Emergency stop: AKTIF"), "{}", status.text);

    // 4. Resume restores normal answers.
    let resume = say(&mut router, OWNER, "emergency resume").await;
    assert_eq!(resume.route, Some(RouteKind::Law));
    assert!(!router.laws().is_emergency_stopped());
    let ok = say(&mut router, CUSTOMER, "netflix harga berapa").await;
    assert!(ok.text.contains("Rp25.000"));
    assert!(ok.blocked.is_none());
}

#[tokio::test]
async fn owner_teaching_adds_knowledge() {
    let mut router = router().await;
    let before = router.knowledge().len();

    let reply = say(&mut router, OWNER, "ajari bot: cara bayar -> transfer ke BCA").await;
    assert_eq!(reply.route, Some(RouteKind::Admin));
    assert!(reply.text.contains("berhasil belajar"), "{}", reply.text);

    assert_eq!(router.knowledge().len(), before + 1);
    let entry = router.knowledge().entries().iter().find(|e| e.input == "cara bayar").unwrap();
    assert_eq!(entry.source, KnowledgeSource::OwnerTeaching);
    assert_eq!(entry.confidence, 1.0);
    assert!(entry.verified);

    // Persisted and logged.
    let stored: Vec<KnowledgeEntry> = router.store().list().await.unwrap();
    assert!(stored.iter().any(|e| e.response == "transfer ke BCA"));
    let log: Vec<LearningEvent> = router.store().list().await.unwrap();
    assert!(log.iter().any(|e| e.kind == LearningEventKind::Taught));

    // Customers now get the taught answer.
    let answer = say(&mut router, CUSTOMER, "cara bayar").await;
    assert_eq!(answer.route, Some(RouteKind::Learned));
    assert_eq!(answer.text, "transfer ke BCA");
}

#[tokio::test]
async fn teaching_a_competitor_phrase_is_refused() {
    let mut router = router().await;
    let before = router.knowledge().len();

    let reply = say(&mut router, OWNER, "ajari bot: ada netflix ori? -> ada kak, netflix ori murah").await;
    assert_eq!(reply.route, Some(RouteKind::Admin));
    assert!(reply.text.contains("ditolak"), "{}", reply.text);
    assert!(reply.text.contains("business_competitor"), "{}", reply.text);
    assert!(reply.blocked.is_none());

    assert_eq!(router.knowledge().len(), before);
    let log: Vec<LearningEvent> = router.store().list().await.unwrap();
    assert!(log.iter().any(|e| e.kind == LearningEventKind::Blocked));
}

// ── Properties ─────────────────────────────────────────────────

#[tokio::test]
async fn short_messages_get_clarification() {
    let mut router = router().await;
    for text in ["a", " ", "?"] {
        let reply = say(&mut router, CUSTOMER, text).await;
        assert_eq!(reply.text, replies::CLARIFY);
        assert_eq!(reply.route, None);
    }
    assert_eq!(router.analytics().total(), 0);
}

#[test]
fn toxic_and_business_phrases_blocked_for_every_action() {
    let mut laws = BotLaws::new(100);
    for action in [ActionKind::SendMessage, ActionKind::AiResponse, ActionKind::Learn, ActionKind::AdminReply] {
        let toxic = laws.validate_action(action, "Dasar BODOH kamu");
        assert!(!toxic.allowed);
        assert_eq!(toxic.law(), Some(Law::UserSafetyRespect));

        for phrase in ["Netflix ori ready", "akun GRATIS", "film bajakan"] {
            let v = laws.validate_action(action, phrase);
            assert_eq!(v.law(), Some(Law::BusinessIntegrity), "{phrase}");
        }
    }
}

#[tokio::test]
async fn promo_with_false_claim_is_filtered() {
    let mut router = router().await;
    // Catalog content goes through the outbound filter too, even for the owner.
    let promo = PromoEntry {
        id: Uuid::new_v4(),
        title: "Beli 1 gratis 1".into(),
        description: String::new(),
        active: true,
    };
    router.store().upsert(&promo).await.unwrap();
    say(&mut router, OWNER, "reload").await;

    let reply = say(&mut router, OWNER, "promo").await;
    assert_eq!(reply.text, replies::CONTACT_ADMIN);
    assert_eq!(reply.blocked.map(|v| v.law), Some(Law::BusinessIntegrity));
}

#[tokio::test]
async fn reinforcement_never_exceeds_one() {
    let mut router = router().await;
    say(&mut router, OWNER, "ajari bot: jam buka toko -> setiap hari 08.00 sampai 22.00").await;
    for i in 0..30 {
        let reply = say(&mut router, CUSTOMER, "jam buka toko").await;
        assert_eq!(reply.route, Some(RouteKind::Learned));
        assert_eq!(reply.cached, i > 0, "ask {i}");
    }
    let entry = router.knowledge().entries().iter().find(|e| e.input == "jam buka toko").unwrap();
    assert!(entry.confidence <= 1.0);
    assert_eq!(entry.usage_count, 30);

    // Cache hits are persisted too.
    let stored: Vec<KnowledgeEntry> = router.store().list().await.unwrap();
    let stored = stored.iter().find(|e| e.input == "jam buka toko").unwrap();
    assert_eq!(stored.usage_count, 30);
}

#[tokio::test]
async fn taught_answer_beats_faq_sharing_one_word() {
    let mut router = router().await;
    let faq = FaqEntry {
        id: Uuid::new_v4(),
        question: "cara order".into(),
        answer: "Order lewat chat admin ya kak.".into(),
        keywords: vec![],
    };
    router.store().upsert(&faq).await.unwrap();
    say(&mut router, OWNER, "reload").await;
    say(&mut router, OWNER, "ajari bot: cara bayar -> transfer ke BCA").await;

    let answer = say(&mut router, CUSTOMER, "cara bayar").await;
    assert_eq!(answer.route, Some(RouteKind::Learned));
    assert_eq!(answer.text, "transfer ke BCA");

    let faq_answer = say(&mut router, CUSTOMER, "cara order").await;
    assert_eq!(faq_answer.route, Some(RouteKind::Hybrid));
    assert!(faq_answer.text.contains("chat admin"), "{}", faq_answer.text);
}

#[tokio::test]
async fn routing_is_deterministic() {
    let mut a = router().await;
    let mut b = router().await;
    for text in ["netflix harga berapa", "menu", "berapa lama pengiriman", "kapan restock youtube premium"] {
        let ra = say(&mut a, CUSTOMER, text).await;
        let rb = say(&mut b, CUSTOMER, text).await;
        assert_eq!(ra.route, rb.route, "{text}");
    }
}

// ── Fallback and learning ──────────────────────────────────────

#[tokio::test]
async fn unknown_question_goes_to_language_model() {
    let mut router = router().await;
    let before = router.knowledge().len() + router.review().len();

    let reply = say(&mut router, CUSTOMER, "kapan restock youtube premium").await;
    assert_eq!(reply.route, Some(RouteKind::LlmFallback));
    assert_eq!(reply.text, LLM_ANSWER);

    // The answer was either learned or queued for review.
    assert_eq!(router.knowledge().len() + router.review().len(), before + 1);
}

#[tokio::test]
async fn model_failure_becomes_friendly_text() {
    let mut router = router_with(MockProvider::failing(LlmError::RateLimited), cfg()).await;
    let reply = say(&mut router, CUSTOMER, "kapan restock youtube premium").await;
    assert_eq!(reply.route, Some(RouteKind::LlmFallback));
    assert!(reply.text.contains("sistem sedang ramai"), "{}", reply.text);

    // The failed call did not consume quota.
    let limit = say(&mut router, CUSTOMER, "limit").await;
    assert!(limit.text.contains("25 dari 25"), "{}", limit.text);
}

#[tokio::test]
async fn daily_quota_caps_fallback_answers() {
    let cfg = BotCfg { llm_daily_limit: 1, ..cfg() };
    let mut router = router_with(MockProvider::new(LLM_ANSWER), cfg).await;
    say(&mut router, CUSTOMER, "kapan restock youtube premium").await;
    let second = say(&mut router, CUSTOMER, "apakah spotify family masih tersedia").await;
    assert_eq!(second.text, replies::QUOTA_EXHAUSTED);
}

#[tokio::test]
async fn out_of_topic_skips_the_model() {
    let mut router = router_with(MockProvider::failing(LlmError::Timeout), cfg()).await;
    let reply = say(&mut router, CUSTOMER, "gimana cuaca hari ini").await;
    assert_eq!(reply.text, replies::OUT_OF_TOPIC);
}

#[tokio::test]
async fn angry_customer_gets_apology_prefix() {
    let mut router = router().await;
    let reply = say(&mut router, CUSTOMER, "kecewa, netflix harga berapa sih").await;
    assert_eq!(reply.route, Some(RouteKind::Hybrid));
    assert!(reply.text.starts_with(replies::ANGRY_PREFIX));
}

// ── Gates and cache ────────────────────────────────────────────

#[tokio::test]
async fn cached_reply_is_served_second_time() {
    let mut router = router().await;
    let first = say(&mut router, CUSTOMER, "netflix harga berapa").await;
    let second = say(&mut router, CUSTOMER, "Netflix harga berapa?").await;
    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.text, second.text);
    assert!(router.performance().cache_hit_ratio() > 0.0);
}

#[tokio::test]
async fn blacklisted_sender_is_ignored() {
    let mut router = router().await;
    let reply = say(&mut router, OWNER, "blacklist 6289999").await;
    assert!(reply.text.contains("blacklist"), "{}", reply.text);
    assert!(router.route_message(&Message::text(jid("6289999"), "halo")).await.is_none());

    say(&mut router, OWNER, "unblacklist 6289999").await;
    assert!(router.route_message(&Message::text(jid("6289999"), "halo")).await.is_some());
}

#[tokio::test]
async fn rapid_messages_are_rate_limited() {
    let mut router = router_with(MockProvider::new(LLM_ANSWER), BotCfg::with_owner(OWNER)).await;
    assert!(router.route_message(&Message::text(jid(CUSTOMER), "menu")).await.is_some());
    assert!(router.route_message(&Message::text(jid(CUSTOMER), "menu")).await.is_none());
    // The owner is never rate limited.
    assert!(router.route_message(&Message::text(jid(OWNER), "menu")).await.is_some());
    assert!(router.route_message(&Message::text(jid(OWNER), "menu")).await.is_some());
}

#[tokio::test]
async fn image_is_acknowledged_and_quoted() {
    let mut router = router().await;
    let reply = router.route_message(&Message::image(jid(CUSTOMER), "")).await.unwrap();
    assert_eq!(reply.route, Some(RouteKind::Image));
    assert_eq!(reply.text, replies::IMAGE_RECEIVED);
    assert!(reply.quoted);
}

// ── Admin commands ─────────────────────────────────────────────

#[tokio::test]
async fn moderator_permissions() {
    let mut router = router().await;
    say(&mut router, OWNER, &format!("tambah mod {MODERATOR} Budi")).await;
    assert!(router.catalog().is_active_moderator(MODERATOR));

    // Teaching is owner-only.
    let teach = say(&mut router, MODERATOR, "ajari bot: jam buka -> 24 jam").await;
    assert_eq!(teach.text, replies::OWNER_ONLY);

    // Stock is open to moderators and invalidates the cached product reply.
    say(&mut router, CUSTOMER, "netflix harga berapa").await;
    let stock = say(&mut router, MODERATOR, "stok netflix 7").await;
    assert!(stock.text.contains('7'), "{}", stock.text);
    let reply = say(&mut router, CUSTOMER, "netflix harga berapa").await;
    assert!(!reply.cached);
    assert!(reply.text.contains("Stok tersedia: 7"), "{}", reply.text);

    // Law commands stay with the owner.
    let law = say(&mut router, MODERATOR, "emergency stop").await;
    assert_ne!(law.route, Some(RouteKind::Law));
    assert!(!router.laws().is_emergency_stopped());

    say(&mut router, OWNER, &format!("hapus mod {MODERATOR}")).await;
    assert!(!router.catalog().is_active_moderator(MODERATOR));
}

#[tokio::test]
async fn review_queue_approve_and_reject() {
    // A high auto-learn bar sends every candidate to review.
    let cfg = BotCfg { auto_learn_threshold: 1.0, ..cfg() };
    let mut router = router_with(MockProvider::new(LLM_ANSWER), cfg).await;
    say(&mut router, CUSTOMER, "kapan restock youtube premium").await;
    assert_eq!(router.review().len(), 1);

    let list = say(&mut router, OWNER, "review list").await;
    assert!(list.text.contains("#1"), "{}", list.text);

    let before = router.knowledge().len();
    let approved = say(&mut router, OWNER, "approve 1").await;
    assert!(approved.text.contains("disetujui"), "{}", approved.text);
    assert_eq!(router.knowledge().len(), before + 1);
    assert!(router.review().is_empty());

    let missing = say(&mut router, OWNER, "reject 1").await;
    assert!(missing.text.contains("tidak ditemukan"));
}

#[tokio::test]
async fn warranty_claim_is_recorded() {
    let mut router = router().await;
    let usage = say(&mut router, CUSTOMER, "klaim").await;
    assert_eq!(usage.text, replies::CLAIM_USAGE);

    let reply = say(&mut router, CUSTOMER, "klaim inv123 akun minta verifikasi").await;
    assert!(reply.text.contains("INV123"), "{}", reply.text);
    let claims: Vec<ClaimLog> = router.store().list().await.unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].number, CUSTOMER);
    assert_eq!(claims[0].complaint, "akun minta verifikasi");
}

#[tokio::test]
async fn claim_keeps_order_id_and_complaint_as_typed() {
    let mut router = router().await;
    let reply = say(&mut router, CUSTOMER, "klaim INV-2024/77 Login gagal, email budi@gmail.com").await;
    assert!(reply.text.contains("INV-2024/77"), "{}", reply.text);

    let claims: Vec<ClaimLog> = router.store().list().await.unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].order_id, "INV-2024/77");
    assert_eq!(claims[0].complaint, "Login gagal, email budi@gmail.com");
}

#[tokio::test]
async fn owner_reports_answer() {
    let mut router = router().await;
    say(&mut router, CUSTOMER, "netflix harga berapa").await;

    for (command, expected) in [
        ("dashboard", "Dashboard"),
        ("analytics", "Analytics"),
        ("performance", "Performa"),
        ("security", "Keamanan"),
        ("monitoring", "cek terakhir"),
        ("cleanup", "Cleanup"),
        ("learning stats", "Statistik Learning"),
        ("law violations", "Pelanggaran"),
    ] {
        let reply = say(&mut router, OWNER, command).await;
        assert!(reply.text.contains(expected), "{command}: {}", reply.text);
    }
}

#[tokio::test]
async fn backup_command_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = ContentStore::in_memory(dir.path()).await.unwrap();
    let mut router = ResponseRouter::new(cfg(), store, Arc::new(MockProvider::new(LLM_ANSWER))).await.unwrap();

    let created = say(&mut router, OWNER, "backup create").await;
    assert!(created.text.contains("Backup"), "{}", created.text);
    let listed = say(&mut router, OWNER, "backup list").await;
    assert!(listed.text.contains("(1)"), "{}", listed.text);
}

#[tokio::test]
async fn attendance_shift_and_report() {
    let mut router = router().await;
    say(&mut router, OWNER, &format!("tambah mod {MODERATOR} Sari Dewi")).await;

    let check_in = say(&mut router, MODERATOR, "absen masuk").await;
    assert!(check_in.text.contains("masuk tercatat"), "{}", check_in.text);
    let check_out = say(&mut router, MODERATOR, "absen keluar").await;
    assert!(check_out.text.contains("keluar tercatat"), "{}", check_out.text);

    let report = say(&mut router, OWNER, "attendance").await;
    assert!(report.text.contains("Sari Dewi"), "{}", report.text);
}
