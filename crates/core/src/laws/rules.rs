//! Immutable rule tables, compiled once. Content is lowercased before testing.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Severity;

pub(crate) enum Test {
    Phrases(&'static [&'static str]),
    Pattern(Regex),
}

pub(crate) struct Rule {
    pub id: &'static str,
    pub reason: &'static str,
    pub severity: Severity,
    test: Test,
}

impl Rule {
    fn phrases(id: &'static str, reason: &'static str, severity: Severity, list: &'static [&'static str]) -> Self {
        Self { id, reason, severity, test: Test::Phrases(list) }
    }

    fn pattern(id: &'static str, reason: &'static str, severity: Severity, re: &str) -> Result<Self, regex::Error> {
        Ok(Self { id, reason, severity, test: Test::Pattern(Regex::new(re)?) })
    }

    pub fn matches(&self, lower: &str) -> bool {
        match &self.test {
            Test::Phrases(list) => list.iter().any(|p| lower.contains(p)),
            Test::Pattern(re) => re.is_match(lower),
        }
    }
}

const COMPETITOR: &[&str] = &[
    "netflix ori",
    "toko sebelah",
    "toko lain lebih murah",
    "beli di tempat lain",
    "olshop lain",
];

const FALSE_CLAIM: &[&str] = &[
    "gratis",
    "garansi seumur hidup",
    "garansi selamanya",
    "harga termurah sedunia",
    "uang kembali 100%",
];

const ILLEGAL: &[&str] = &["bajakan", "carding", "akun curian", "cc bodong", "crack", "akun hasil hack"];

const MISLEADING: &[&str] = &[
    "dijamin 100%",
    "pasti 100%",
    "tanpa risiko",
    "tidak akan pernah error",
    "pasti untung",
];

const TOXIC_WORDS: &str = r"\b(?:anjing|anjir|bangsat|goblok|goblog|tolol|bodoh|bego|kampret|babi|brengsek|bajingan|idiot|kontol|memek|asu)\b";
const SLANG_WORDS: &str = r"\b(?:gue|gua|gw|lu|lo|elo|elu|bacot|wkwk+|anjay|bodo amat)\b";

/// Critical subset re-tested by the non-bypassable absolute check.
const CRITICAL_PHRASES: &[&str] = &["netflix ori", "bajakan", "carding", "akun curian"];
const CRITICAL_WORDS: &str = r"\b(?:anjing|bangsat|kontol|memek)\b";

/// Longest response accepted into the knowledge store.
pub(crate) const MAX_LEARNED_CHARS: usize = 1000;

pub(crate) struct Rulebook {
    /// Law #1, tested in order.
    pub business: Vec<Rule>,
    /// Law #2, tested in order.
    pub safety: Vec<Rule>,
    /// Law #3 checks beyond re-running #1 and #2.
    pub compliance: Vec<Rule>,
    pub critical: Vec<Rule>,
    pub troubleshooting: Regex,
    pub order_request: Regex,
}

impl Rulebook {
    fn compile() -> Result<Self, regex::Error> {
        use Severity::*;
        Ok(Self {
            business: vec![
                Rule::phrases("business_competitor", "Menyebut kompetitor atau produk non-resmi", High, COMPETITOR),
                Rule::phrases("business_false_claim", "Klaim harga atau garansi yang tidak bisa dipenuhi", High, FALSE_CLAIM),
                Rule::phrases("business_illegal_content", "Menyebut konten atau transaksi ilegal", Critical, ILLEGAL),
            ],
            safety: vec![
                Rule::pattern("safety_toxic_language", "Mengandung kata kasar", High, TOXIC_WORDS)?,
                Rule::pattern("safety_unprofessional_slang", "Bahasa tidak profesional", Medium, SLANG_WORDS)?,
                Rule::phrases("safety_misleading_claim", "Janji yang menyesatkan pelanggan", Medium, MISLEADING),
            ],
            compliance: vec![
                Rule::pattern("learning_external_link", "Jawaban berisi tautan eksternal", Medium, r"https?://|www\.")?,
                Rule::pattern(
                    "learning_personal_data",
                    "Jawaban berisi nomor telepon pribadi",
                    High,
                    r"\b(?:\+?62|08)\d{8,12}\b",
                )?,
            ],
            critical: vec![
                Rule::phrases("absolute_business", "Pelanggaran bisnis kritis", Critical, CRITICAL_PHRASES),
                Rule::pattern("absolute_toxic", "Kata kasar kritis", Critical, CRITICAL_WORDS)?,
            ],
            troubleshooting: Regex::new(
                r"\b(?:error|gagal login|tidak bisa login|gak bisa login|ga bisa login|tidak bisa masuk|akun bermasalah|kena logout|ter-?logout)\b",
            )?,
            order_request: Regex::new(
                r"(?:nomor|no\.?|id|kode)\s*(?:order|pesanan|invoice|transaksi)|order\s*id|invoice",
            )?,
        })
    }
}

pub(crate) static RULEBOOK: LazyLock<Result<Rulebook, regex::Error>> = LazyLock::new(Rulebook::compile);
