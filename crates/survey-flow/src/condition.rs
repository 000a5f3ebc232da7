use crate::answers::Answer;
use crate::spec::Condition;

/// Evaluates a rule condition against an answer; a missing answer compares as empty text.
pub fn evaluate(condition: Condition, answer: Option<&Answer>, value: &str) -> bool {
    let text = answer.map(Answer::as_text).unwrap_or_default();
    match condition {
        Condition::Equals => text == value,
        Condition::NotEquals => text != value,
        Condition::Contains => match answer {
            Some(Answer::Multi(values)) => values.iter().any(|selected| selected == value),
            _ => false,
        },
        Condition::Mentions => match answer {
            Some(Answer::Multi(values)) => values.iter().any(|selected| selected.contains(value)),
            Some(Answer::Single(text)) | Some(Answer::Text(text)) => text.contains(value),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_uses_text_form() {
        let multi = Answer::Multi(vec!["2".into(), "5".into()]);
        assert!(evaluate(Condition::Equals, Some(&multi), "2,5"));
        assert!(!evaluate(Condition::Equals, Some(&multi), "2"));
        assert!(evaluate(Condition::NotEquals, None, "1"));
        assert!(!evaluate(Condition::Equals, None, "1"));
    }

    #[test]
    fn contains_requires_multi_membership() {
        let multi = Answer::Multi(vec!["12".into()]);
        assert!(!evaluate(Condition::Contains, Some(&multi), "1"));
        assert!(evaluate(Condition::Contains, Some(&multi), "12"));
        let single = Answer::Single("12".into());
        assert!(!evaluate(Condition::Contains, Some(&single), "12"));
    }

    #[test]
    fn mentions_matches_substrings() {
        let multi = Answer::Multi(vec!["3".into(), "99".into()]);
        assert!(evaluate(Condition::Mentions, Some(&multi), "99"));
        let text = Answer::Text("code 991".into());
        assert!(evaluate(Condition::Mentions, Some(&text), "99"));
        assert!(!evaluate(Condition::Mentions, None, "99"));
    }
}
