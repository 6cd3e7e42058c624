//! Priority cascade: one ordered table of route selectors, walked top to
//! bottom. The first selector returning a decision wins; the language-model
//! fallback closes the table so every message resolves to exactly one route.

use super::route::{Route, RouteContext, RouteDecision};
use crate::classify::{command, hybrid};
use crate::types::{MessageType, SenderRole};

pub type Selector = fn(&RouteContext<'_>) -> Option<RouteDecision>;

/// The cascade, highest priority first. Priority = index + 1.
pub const CASCADE: &[(&str, Selector)] = &[
    ("image", image),
    ("law_command", law_command),
    ("ops_command", ops_command),
    ("learning_command", learning_command),
    ("admin_command", admin_command),
    ("system_command", system_command),
    ("hybrid", hybrid_lookup),
    ("learned", learned_lookup),
    ("llm_fallback", llm_fallback),
];

/// Walk the cascade. Deterministic for a given text, role and content.
pub fn select(ctx: &RouteContext<'_>) -> RouteDecision {
    CASCADE
        .iter()
        .enumerate()
        .find_map(|(i, (name, selector))| {
            selector(ctx).map(|mut decision| {
                decision.priority = u8::try_from(i + 1).unwrap_or(u8::MAX);
                tracing::debug!(route = name, confidence = decision.confidence, "route selected");
                decision
            })
        })
        .unwrap_or_else(|| fallback_decision(ctx))
}

fn decided(route: Route, confidence: f32) -> Option<RouteDecision> {
    // Priority is filled in by `select`.
    Some(RouteDecision { route, priority: 0, confidence })
}

fn image(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    if ctx.message.message_type != MessageType::Image {
        return None;
    }
    decided(Route::Image, 1.0)
}

fn law_command(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    if ctx.role != SenderRole::Owner {
        return None;
    }
    decided(Route::Law(command::parse_law(ctx.text)?), 1.0)
}

fn ops_command(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    if ctx.role != SenderRole::Owner {
        return None;
    }
    decided(Route::Ops(command::parse_ops(ctx.text)?), 1.0)
}

fn learning_command(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    decided(Route::Learning(command::parse_learning(ctx.text)?), 1.0)
}

fn admin_command(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    if !ctx.role.is_admin() {
        return None;
    }
    decided(Route::Admin(command::parse_admin(ctx.text)?), 1.0)
}

fn system_command(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    decided(Route::System(command::parse_system(ctx.text)?), 1.0)
}

fn hybrid_lookup(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    let m = hybrid::classify(ctx.text, ctx.catalog, ctx.cfg)?;
    if m.confidence <= ctx.cfg.hybrid_threshold {
        return None;
    }
    let confidence = m.confidence;
    decided(Route::Hybrid(m), confidence)
}

fn learned_lookup(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    let m = ctx.knowledge.find_best(ctx.text)?;
    let confidence = m.confidence;
    decided(Route::Learned(m), confidence)
}

fn llm_fallback(ctx: &RouteContext<'_>) -> Option<RouteDecision> {
    Some(fallback_decision(ctx))
}

fn fallback_decision(ctx: &RouteContext<'_>) -> RouteDecision {
    RouteDecision {
        route: Route::LlmFallback,
        priority: u8::try_from(CASCADE.len()).unwrap_or(u8::MAX),
        confidence: ctx.cfg.fallback_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::classify::command::{LawCommand, SystemCommand};
    use crate::config::BotCfg;
    use crate::knowledge::KnowledgeStore;
    use crate::router::RouteKind;
    use crate::types::{KnowledgeSource, Message, ProductSheet};
    use uuid::Uuid;

    struct Fixture {
        catalog: Catalog,
        knowledge: KnowledgeStore,
        cfg: BotCfg,
    }

    impl Fixture {
        fn new() -> Self {
            let cfg = BotCfg::default();
            let mut knowledge = KnowledgeStore::new(&cfg);
            knowledge.learn("cara bayar", "transfer ke BCA", 1.0, KnowledgeSource::OwnerTeaching);
            let catalog = Catalog {
                products: vec![ProductSheet {
                    id: Uuid::new_v4(),
                    name: "netflix".into(),
                    body: "Netflix 1 bulan Rp25.000".into(),
                    aliases: vec![],
                }],
                ..Catalog::default()
            };
            Self { catalog, knowledge, cfg }
        }

        fn route(&self, msg: &Message, role: SenderRole) -> RouteDecision {
            let ctx = RouteContext {
                message: msg,
                text: msg.text.trim(),
                role,
                catalog: &self.catalog,
                knowledge: &self.knowledge,
                cfg: &self.cfg,
            };
            select(&ctx)
        }
    }

    #[test]
    fn cascade_order_is_fixed() {
        let names: Vec<&str> = CASCADE.iter().map(|(n, _)| *n).collect();
        assert_eq!(names.first(), Some(&"image"));
        assert_eq!(names.last(), Some(&"llm_fallback"));
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn image_beats_everything() {
        let f = Fixture::new();
        let d = f.route(&Message::image("1", "emergency stop"), SenderRole::Owner);
        assert_eq!(d.route, Route::Image);
        assert_eq!(d.priority, 1);
    }

    #[test]
    fn law_commands_need_owner() {
        let f = Fixture::new();
        let msg = Message::text("1", "emergency stop");
        assert_eq!(f.route(&msg, SenderRole::Owner).route, Route::Law(LawCommand::EmergencyStop));
        assert_eq!(f.route(&msg, SenderRole::Moderator).route.kind(), RouteKind::LlmFallback);
    }

    #[test]
    fn content_routes_by_confidence() {
        let f = Fixture::new();
        let d = f.route(&Message::text("1", "netflix harga berapa"), SenderRole::Customer);
        assert_eq!(d.route.kind(), RouteKind::Hybrid);
        assert!(d.confidence >= 0.8);
        assert_eq!(d.priority, 7);

        let d = f.route(&Message::text("1", "cara bayar"), SenderRole::Customer);
        assert_eq!(d.route.kind(), RouteKind::Learned);

        let d = f.route(&Message::text("1", "kapan restock youtube"), SenderRole::Customer);
        assert_eq!(d.route, Route::LlmFallback);
        assert_eq!(d.priority, 9);
        assert!((d.confidence - 0.3).abs() < 1e-6);
    }

    #[test]
    fn greeting_is_system() {
        let f = Fixture::new();
        let d = f.route(&Message::text("1", "halo"), SenderRole::Customer);
        assert_eq!(d.route, Route::System(SystemCommand::Greeting));
    }

    #[test]
    fn same_input_same_route() {
        let f = Fixture::new();
        for text in ["netflix harga berapa", "halo", "cara bayar", "apa kabar", "learning stats"] {
            let a = f.route(&Message::text("1", text), SenderRole::Customer);
            let b = f.route(&Message::text("1", text), SenderRole::Customer);
            assert_eq!(a, b, "{text}");
        }
    }
}
