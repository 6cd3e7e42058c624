use resbot_llm::provider::ChatMessage;

use crate::types::{ProductSheet, PromoEntry, Speaker, Turn};

pub const SHOP_NAME: &str = "Vylozzone";

const WARRANTY_POLICY: &str = "Garansi berlaku sesuai durasi paket. Klaim garansi wajib menyertakan nomor order \
dan bukti kendala. Garansi tidak berlaku jika pelanggan mengubah email atau password akun.";

const PAYMENT_POLICY: &str = "Pembayaran via transfer bank (BCA, BRI, Mandiri), DANA, OVO, GoPay dan QRIS. \
Pesanan diproses setelah bukti transfer dikirim ke admin.";

const RULES: &str = "- Jawab singkat, ramah, dalam bahasa Indonesia, panggil pelanggan \"kak\".\n\
- Hanya bahas produk dan layanan toko ini.\n\
- Jangan menyebut toko lain atau menjanjikan hal di luar kebijakan.\n\
- Untuk kendala akun atau pesanan, minta nomor order.\n\
- Jika tidak tahu jawabannya, sarankan menghubungi admin.";

/// Product lines included in the prompt. Long catalogs are cut here.
const MAX_PRODUCTS: usize = 30;

/// Business context embedded in every fallback prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub products: &'a [ProductSheet],
    pub promos: &'a [PromoEntry],
    pub history: &'a [Turn],
}

pub fn system_prompt(ctx: &PromptContext<'_>) -> String {
    let mut out = format!("Kamu adalah customer service {SHOP_NAME}, toko akun premium digital.\n\nATURAN:\n{RULES}\n");

    if !ctx.products.is_empty() {
        out.push_str("\nPRODUK:\n");
        for p in ctx.products.iter().take(MAX_PRODUCTS) {
            let summary = p.body.lines().next().unwrap_or_default().trim();
            out.push_str(&format!("- {}: {}\n", p.name, summary));
        }
    }

    let promos: Vec<&PromoEntry> = ctx.promos.iter().filter(|p| p.active).collect();
    if !promos.is_empty() {
        out.push_str("\nPROMO AKTIF:\n");
        for p in promos {
            out.push_str(&format!("- {}: {}\n", p.title, p.description));
        }
    }

    out.push_str(&format!("\nGARANSI: {WARRANTY_POLICY}\nPEMBAYARAN: {PAYMENT_POLICY}\n"));
    out
}

/// System prompt, prior turns, then the customer's message.
pub fn build(ctx: &PromptContext<'_>, text: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system_prompt(ctx))];
    messages.extend(ctx.history.iter().map(|t| match t.speaker {
        Speaker::Customer => ChatMessage::user(t.text.clone()),
        Speaker::Bot => ChatMessage::assistant(t.text.clone()),
    }));
    messages.push(ChatMessage::user(text));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use resbot_llm::provider::Role;
    use uuid::Uuid;

    #[test]
    fn prompt_embeds_catalog_and_policy() {
        let products = vec![ProductSheet {
            id: Uuid::new_v4(),
            name: "netflix".into(),
            body: "Netflix 1 bulan Rp25.000\nsharing 1 profil".into(),
            aliases: vec![],
        }];
        let promos = vec![PromoEntry {
            id: Uuid::new_v4(),
            title: "Ramadhan".into(),
            description: "diskon 10%".into(),
            active: false,
        }];
        let ctx = PromptContext { products: &products, promos: &promos, history: &[] };
        let prompt = system_prompt(&ctx);
        assert!(prompt.contains("- netflix: Netflix 1 bulan Rp25.000"));
        assert!(!prompt.contains("sharing 1 profil"));
        assert!(!prompt.contains("Ramadhan"));
        assert!(prompt.contains("GARANSI"));
    }

    #[test]
    fn history_maps_to_roles() {
        let history = vec![
            Turn { speaker: Speaker::Customer, text: "halo".into() },
            Turn { speaker: Speaker::Bot, text: "halo kak".into() },
        ];
        let ctx = PromptContext { products: &[], promos: &[], history: &history };
        let messages = build(&ctx, "ada spotify?");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[3].content, "ada spotify?");
    }
}
