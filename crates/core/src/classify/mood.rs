//! Customer mood from keyword lists. Angry beats positive beats out-of-topic.

use super::similarity::normalize;

const ANGRY: &[&str] = &[
    "kecewa", "marah", "kesal", "kesel", "lama banget", "lama bgt", "parah", "penipu", "nipu",
    "bohong", "refund", "ga becus", "gak becus", "lelet", "zonk", "komplain",
];

const POSITIVE: &[&str] = &[
    "makasih", "terima kasih", "thanks", "thank you", "mantap", "mantul", "puas", "keren",
    "recommended", "amanah", "sukses terus",
];

const OUT_OF_TOPIC: &[&str] = &[
    "pacar", "cuaca", "politik", "presiden", "sepak bola", "resep", "zodiak", "curhat",
    "pr matematika", "tugas sekolah", "gebetan", "jodoh",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Angry,
    Positive,
    OutOfTopic,
    Neutral,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Angry => "angry",
            Self::Positive => "positive",
            Self::OutOfTopic => "out_of_topic",
            Self::Neutral => "neutral",
        }
    }
}

/// Mood label and a confidence that grows with the number of hits.
pub fn detect(text: &str) -> (Mood, f32) {
    let padded = format!(" {} ", normalize(text));
    let hits = |list: &[&str]| list.iter().filter(|k| padded.contains(&format!(" {k} "))).count();

    // Repeated exclamation marks read as shouting.
    let shouting = usize::from(text.contains("!!!"));
    let angry = hits(ANGRY) + shouting;
    if angry > 0 {
        return (Mood::Angry, score(angry));
    }
    let positive = hits(POSITIVE);
    if positive > 0 {
        return (Mood::Positive, score(positive));
    }
    let off = hits(OUT_OF_TOPIC);
    if off > 0 {
        return (Mood::OutOfTopic, score(off));
    }
    (Mood::Neutral, 0.0)
}

fn score(hits: usize) -> f32 {
    (0.5 + hits as f32 * 0.2).min(1.0)
}
