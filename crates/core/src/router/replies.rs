//! Fixed reply texts.

use crate::fallback::prompt::SHOP_NAME;

pub const GREETINGS: [&str; 3] = [
    "Halo kak! 👋 Selamat datang di Vylozzone. Ada yang bisa kami bantu? Ketik *menu* untuk melihat layanan kami.",
    "Hai kak! 😊 Terima kasih sudah menghubungi Vylozzone. Silakan ketik *menu* atau langsung tanyakan produk yang kakak cari.",
    "Halo kak, selamat datang! 🙌 Mau cari akun premium apa hari ini? Ketik *produk* untuk melihat daftar produk.",
];

pub const GREETING_RETURNING: &str = "Halo lagi kak! 😊 Ada yang bisa dibantu lagi?";

pub const CLARIFY: &str = "Maaf kak, pesannya terlalu singkat. Boleh dijelaskan lebih detail? 🙏";

pub const APOLOGY: &str = "Maaf kak, sedang ada kendala di sistem kami. Silakan coba lagi sebentar lagi ya 🙏";

pub const CONTACT_ADMIN: &str = "Maaf kak, pertanyaan ini perlu dibantu langsung oleh admin. Silakan hubungi admin ya 🙏";

pub const MAINTENANCE: &str = "Mohon maaf kak, bot sedang dalam pemeliharaan. Admin akan segera membalas ya 🙏";

pub const IMAGE_RECEIVED: &str = "Terima kasih kak, gambarnya sudah kami terima. Admin akan segera mengecek ya 🙏";

pub const OUT_OF_TOPIC: &str =
    "Maaf kak, kami hanya bisa membantu seputar produk dan layanan toko 😊 Ketik *menu* untuk melihat layanan kami.";

pub const ANGRY_PREFIX: &str = "Mohon maaf atas ketidaknyamanannya kak 🙏\n\n";

pub const SPAM_WARNING: &str =
    "Mohon tidak mengirim pesan berulang ya kak. Pesan kakak akan kami balas satu per satu 🙏";

pub const QUOTA_EXHAUSTED: &str =
    "Maaf kak, batas pertanyaan otomatis hari ini sudah habis. Admin akan membantu langsung ya 🙏";

pub const THANKS: &str = "Sama-sama kak! 😊 Senang bisa membantu.";

pub const OWNER_ONLY: &str = "Perintah ini khusus owner.";

pub const NO_PROMO: &str = "Saat ini belum ada promo aktif kak. Pantau terus ya 😊";

pub const NO_PRODUCTS: &str = "Daftar produk sedang diperbarui kak. Silakan hubungi admin ya 🙏";

pub const CLAIM_USAGE: &str = "Format klaim: *klaim <nomor order> <keluhan>*\nContoh: klaim INV123 akun tidak bisa login";

pub const LEARNING_HELP: &str = "📚 *Perintah Learning*\n\
• learning stats : statistik pengetahuan bot\n\
• learning reset : hapus riwayat percakapan kakak\n\
• learning help : bantuan ini\n\n\
Owner:\n\
• ajari bot: <pertanyaan> -> <jawaban>\n\
• review list / approve <n> / reject <n>";

pub fn menu() -> String {
    format!(
        "📋 *Menu {SHOP_NAME}*\n\n\
         • *produk* : daftar produk\n\
         • *promo* : promo yang sedang berjalan\n\
         • *limit* : sisa kuota tanya jawab otomatis\n\
         • *klaim <nomor order> <keluhan>* : klaim garansi\n\n\
         Atau langsung tanyakan produk yang kakak cari 😊"
    )
}
