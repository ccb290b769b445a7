//! Light field extraction from free-text model output.
//!
//! The sandbox returns whatever the model wrote. Nothing here is schema
//! validation: each parser pulls the one or two fields its task's prompt asks
//! for and checks labels against the task's closed set. Anything outside the
//! set becomes [`Label::Undeterminable`].

use crate::task::prompts::TONE_UNDETERMINABLE;
use crate::task::{TaskDefinition, TaskKind};
use crate::types::{IntensityLevel, Label, TensionMetrics, Verdict};
use once_cell::sync::Lazy;
use regex::Regex;

static EMOTION_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"情緒[：:]\s*([^：:\n\r]+)").expect("valid emotion pattern"));
static INTENSITY_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"強度[：:]\s*([^：:\n\r]+)").expect("valid intensity pattern"));
static SCORE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"程度[：:]\s*(\d+(?:\.\d+)?)").expect("valid score pattern"));
static MODIFIER_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Modifier[：:]\s*(\d+)").expect("valid modifier pattern"));
static IDIOM_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Idiom[：:]\s*(\d+)").expect("valid idiom pattern"));
static DEGREE_HEAD_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)DegreeHead[：:]\s*(\d+)").expect("valid degree head pattern"));
static WORD_COUNT_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)WordCount[：:]\s*(\d+)").expect("valid word count pattern"));
static TENSION_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Tension[：:]\s*(\d+(?:\.\d+)?)").expect("valid tension pattern")
});

/// Dispatch to the parser for a task's output format.
pub fn parse_verdict(task: &TaskDefinition, raw: &str) -> Verdict {
    match task.kind {
        TaskKind::Emotion => Verdict::Label {
            label: parse_emotion(raw, &task.labels),
        },
        TaskKind::Tone => Verdict::Label {
            label: parse_tone(raw, &task.labels),
        },
        TaskKind::Tension => Verdict::Tension {
            metrics: parse_tension(raw),
        },
        TaskKind::Intensity => Verdict::Intensity {
            label: parse_emotion(raw, &task.labels),
            level: parse_intensity(raw),
        },
        TaskKind::Score => Verdict::Score {
            label: parse_emotion(raw, &task.labels),
            score: parse_score(raw),
        },
    }
}

/// Extract `情緒：<label>`; without the field, fall back to any label
/// mentioned in the text.
pub fn parse_emotion(raw: &str, labels: &[String]) -> Label {
    match EMOTION_FIELD.captures(raw).and_then(|c| c.get(1)) {
        Some(value) => match_label(value.as_str(), labels),
        None => find_label(raw, labels),
    }
}

/// Tone answers are a bare label, optionally quoted or wrapped in prose.
/// The prompt's own "cannot tell" answer is never a label.
pub fn parse_tone(raw: &str, labels: &[String]) -> Label {
    if clean(raw) == TONE_UNDETERMINABLE {
        return Label::Undeterminable;
    }
    match_label(raw, labels)
}

/// Extract `程度：<score>`. Scores outside `[0, 1]` are dropped.
pub fn parse_score(raw: &str) -> Option<f64> {
    SCORE_FIELD
        .captures(raw)?
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|s| (0.0..=1.0).contains(s))
}

pub fn parse_tension(raw: &str) -> TensionMetrics {
    let mut metrics = TensionMetrics {
        modifier: capture_u32(&MODIFIER_FIELD, raw),
        idiom: capture_u32(&IDIOM_FIELD, raw),
        degree_head: capture_u32(&DEGREE_HEAD_FIELD, raw),
        word_count: capture_u32(&WORD_COUNT_FIELD, raw),
        tension: TENSION_FIELD
            .captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok()),
    };
    if metrics.tension.is_none() {
        metrics.tension = compute_tension(&metrics);
    }
    metrics
}

/// `(modifier + idiom + 2 * degree_head) / word_count`, two decimals.
pub fn compute_tension(metrics: &TensionMetrics) -> Option<f64> {
    let word_count = metrics.word_count.filter(|w| *w > 0)?;
    let numerator =
        metrics.modifier? as f64 + metrics.idiom? as f64 + 2.0 * metrics.degree_head? as f64;
    Some((numerator / word_count as f64 * 100.0).round() / 100.0)
}

pub fn parse_intensity(raw: &str) -> Option<IntensityLevel> {
    if let Some(value) = INTENSITY_FIELD.captures(raw).and_then(|c| c.get(1)) {
        return normalize_intensity(value.as_str());
    }
    if raw.contains("Low") || raw.contains('低') {
        Some(IntensityLevel::Low)
    } else if raw.contains("Medium") || raw.contains('中') {
        Some(IntensityLevel::Medium)
    } else if raw.contains("High") || raw.contains('高') {
        Some(IntensityLevel::High)
    } else {
        None
    }
}

fn normalize_intensity(value: &str) -> Option<IntensityLevel> {
    let value = value.trim();
    if let Some(level) = IntensityLevel::ALL
        .into_iter()
        .find(|l| l.as_str().eq_ignore_ascii_case(value))
    {
        return Some(level);
    }
    match value {
        "低" | "低強度" => Some(IntensityLevel::Low),
        "中" | "中強度" => Some(IntensityLevel::Medium),
        "高" | "高強度" => Some(IntensityLevel::High),
        _ => None,
    }
}

fn capture_u32(re: &Regex, raw: &str) -> Option<u32> {
    re.captures(raw)?.get(1)?.as_str().parse().ok()
}

const WRAPPING: &[char] = &['「', '」', '『', '』', '"', '\'', '“', '”', '。', '.', '，', ',', '！', '!'];

fn clean(value: &str) -> &str {
    value.trim().trim_matches(WRAPPING).trim()
}

/// Exact match after stripping quotes and punctuation, else containment.
fn match_label(value: &str, labels: &[String]) -> Label {
    let cleaned = clean(value);
    if let Some(label) = labels.iter().find(|l| l.as_str() == cleaned) {
        return Label::Known(label.clone());
    }
    find_label(value, labels)
}

/// Longest label contained in the text, so that overlapping labels resolve
/// to the most specific one.
fn find_label(text: &str, labels: &[String]) -> Label {
    labels
        .iter()
        .filter(|l| !l.is_empty() && text.contains(l.as_str()))
        .max_by_key(|l| l.chars().count())
        .map(|l| Label::Known(l.clone()))
        .unwrap_or(Label::Undeterminable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::prompts::{EMOTION_LABELS, TONE_LABELS};

    fn labels(set: &[&str]) -> Vec<String> {
        set.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_emotion_field_full_and_half_width_colon() {
        let set = labels(EMOTION_LABELS);
        assert_eq!(parse_emotion("情緒：悲傷", &set), Label::Known("悲傷".into()));
        assert_eq!(parse_emotion("情緒: 喜悅\n", &set), Label::Known("喜悅".into()));
    }

    #[test]
    fn test_emotion_outside_closed_set_is_undeterminable() {
        let set = labels(EMOTION_LABELS);
        assert_eq!(parse_emotion("情緒：無聊", &set), Label::Undeterminable);
        assert_eq!(parse_emotion("I cannot tell.", &set), Label::Undeterminable);
    }

    #[test]
    fn test_emotion_fallback_scans_text() {
        let set = labels(EMOTION_LABELS);
        assert_eq!(
            parse_emotion("這句話主要表達恐懼。", &set),
            Label::Known("恐懼".into())
        );
    }

    #[test]
    fn test_tone_matching() {
        let set = labels(TONE_LABELS);
        assert_eq!(parse_tone("憤怒語調", &set), Label::Known("憤怒語調".into()));
        assert_eq!(parse_tone("「疑問語調」。", &set), Label::Known("疑問語調".into()));
        assert_eq!(parse_tone("無法判斷", &set), Label::Undeterminable);
    }

    #[test]
    fn test_tone_sentinel_wins_over_label_set() {
        let mut set = labels(TONE_LABELS);
        set.push(TONE_UNDETERMINABLE.to_string());
        assert_eq!(parse_tone("「無法判斷」", &set), Label::Undeterminable);
        assert_eq!(parse_tone("平淡語氣", &set), Label::Known("平淡語氣".into()));
    }

    #[test]
    fn test_score_field() {
        assert_eq!(parse_score("情緒：悲傷 程度：0.65"), Some(0.65));
        assert_eq!(parse_score("情緒：喜悅\n程度: 1"), Some(1.0));
        assert_eq!(parse_score("情緒：喜悅 程度：7"), None);
        assert_eq!(parse_score("情緒：喜悅"), None);

        let def = TaskDefinition::builtin(TaskKind::Score);
        assert_eq!(
            parse_verdict(&def, "情緒：悲傷 程度：0.65"),
            Verdict::Score {
                label: Label::Known("悲傷".into()),
                score: Some(0.65),
            }
        );
    }

    #[test]
    fn test_tension_full_output() {
        let raw = "Modifier：2\nIdiom：0\nDegreeHead：1\nWordCount：23\nTension：0.17";
        let m = parse_tension(raw);
        assert_eq!(m.modifier, Some(2));
        assert_eq!(m.idiom, Some(0));
        assert_eq!(m.degree_head, Some(1));
        assert_eq!(m.word_count, Some(23));
        assert_eq!(m.tension, Some(0.17));
    }

    #[test]
    fn test_tension_only_score() {
        let m = parse_tension("Tension：0.17");
        assert_eq!(m.tension, Some(0.17));
        assert_eq!(m.word_count, None);
    }

    #[test]
    fn test_tension_computed_when_missing() {
        let m = parse_tension("Modifier: 2\nIdiom: 0\nDegreeHead: 1\nWordCount: 23");
        assert_eq!(m.tension, Some(0.17));

        let m = parse_tension("Modifier: 2\nIdiom: 0\nDegreeHead: 1\nWordCount: 0");
        assert_eq!(m.tension, None);
    }

    #[test]
    fn test_intensity_normalization() {
        assert_eq!(parse_intensity("情緒：憤怒\n強度：High"), Some(IntensityLevel::High));
        assert_eq!(parse_intensity("強度：中強度"), Some(IntensityLevel::Medium));
        assert_eq!(parse_intensity("強度：extreme"), None);
        assert_eq!(parse_intensity("level Low"), Some(IntensityLevel::Low));
        assert_eq!(parse_intensity("nothing"), None);
    }

    #[test]
    fn test_parse_verdict_dispatch() {
        let def = TaskDefinition::builtin(TaskKind::Intensity);
        let verdict = parse_verdict(&def, "情緒：期待\n強度：Low");
        assert_eq!(
            verdict,
            Verdict::Intensity {
                label: Label::Known("期待".into()),
                level: Some(IntensityLevel::Low),
            }
        );
    }
}
