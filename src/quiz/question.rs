use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::InvalidQuestion;

/// A single multiple-choice question. Field names on disk follow the catalog
/// JSON format (`question`, `options`, `answer`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "answer")]
    pub correct_answer: String,
}

impl Question {
    pub fn new(text: &str, options: &[&str], correct_answer: &str) -> Self {
        Self {
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct_answer.to_string(),
        }
    }

    /// Correctness is text equality with the answer, never option position.
    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.correct_answer
    }

    /// Check the catalog preconditions: at least two options, unique option
    /// texts, and an answer that is one of the options.
    pub fn validate(&self) -> Result<(), InvalidQuestion> {
        if self.options.len() < 2 {
            return Err(InvalidQuestion::TooFewOptions(self.options.len()));
        }
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(InvalidQuestion::DuplicateOption(option.clone()));
            }
        }
        if !seen.contains(self.correct_answer.as_str()) {
            return Err(InvalidQuestion::AnswerNotAnOption);
        }
        Ok(())
    }
}

/// Subject -> Topic -> questions. Sorted maps keep listing order stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    subjects: BTreeMap<String, BTreeMap<String, Vec<Question>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append questions to a topic, creating the subject and topic as needed.
    pub fn insert(&mut self, subject: &str, topic: &str, questions: Vec<Question>) {
        self.subjects
            .entry(subject.to_string())
            .or_default()
            .entry(topic.to_string())
            .or_default()
            .extend(questions);
    }

    pub fn merge(&mut self, other: Catalog) {
        for (subject, topics) in other.subjects {
            for (topic, questions) in topics {
                self.insert(&subject, &topic, questions);
            }
        }
    }

    /// True when no topic holds a single question.
    pub fn is_empty(&self) -> bool {
        self.subjects
            .values()
            .flat_map(BTreeMap::values)
            .all(Vec::is_empty)
    }

    pub fn subjects(&self) -> Vec<&str> {
        self.subjects.keys().map(String::as_str).collect()
    }

    pub fn topics(&self, subject: &str) -> Vec<&str> {
        self.subjects
            .get(subject)
            .map(|topics| topics.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn questions(&self, subject: &str, topic: &str) -> Option<&[Question]> {
        self.subjects
            .get(subject)
            .and_then(|topics| topics.get(topic))
            .map(Vec::as_slice)
    }

    /// Drop questions that break the catalog preconditions. Returns every
    /// rejected question's location and reason; empty topics are kept.
    pub fn retain_valid(&mut self) -> Vec<(String, String, InvalidQuestion)> {
        let mut rejected = Vec::new();
        for (subject, topics) in &mut self.subjects {
            for (topic, questions) in topics.iter_mut() {
                questions.retain(|q| match q.validate() {
                    Ok(()) => true,
                    Err(reason) => {
                        rejected.push((subject.clone(), topic.clone(), reason));
                        false
                    }
                });
            }
        }
        rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capital() -> Question {
        Question::new("Capital of France?", &["Paris", "Rome", "Madrid"], "Paris")
    }

    #[test]
    fn test_correctness_is_text_equality() {
        let q = capital();
        assert!(q.is_correct("Paris"));
        assert!(!q.is_correct("paris"));
        assert!(!q.is_correct("Rome"));
    }

    #[test]
    fn test_validate_rejects_bad_questions() {
        assert!(capital().validate().is_ok());

        let one = Question::new("?", &["a"], "a");
        assert_eq!(one.validate(), Err(InvalidQuestion::TooFewOptions(1)));

        let dup = Question::new("?", &["a", "a", "b"], "a");
        assert_eq!(
            dup.validate(),
            Err(InvalidQuestion::DuplicateOption("a".to_string()))
        );

        let missing = Question::new("?", &["a", "b"], "c");
        assert_eq!(missing.validate(), Err(InvalidQuestion::AnswerNotAnOption));

        let reasons: Vec<String> = [one, dup, missing]
            .iter()
            .filter_map(|q| q.validate().err())
            .map(|reason| reason.to_string())
            .collect();
        assert_eq!(
            reasons,
            vec![
                "only 1 option(s)",
                "duplicate option \"a\"",
                "answer is not one of the options"
            ]
        );
    }

    #[test]
    fn test_catalog_lists_sorted() {
        let mut catalog = Catalog::new();
        catalog.insert("Science", "Physics", vec![capital()]);
        catalog.insert("Math", "Geometry", vec![capital()]);
        catalog.insert("Math", "Algebra", vec![capital()]);
        assert_eq!(catalog.subjects(), vec!["Math", "Science"]);
        assert_eq!(catalog.topics("Math"), vec!["Algebra", "Geometry"]);
        assert!(catalog.topics("History").is_empty());
        assert!(catalog.questions("Math", "Calculus").is_none());
    }

    #[test]
    fn test_merge_appends_same_topic() {
        let mut a = Catalog::new();
        a.insert("Math", "Algebra", vec![capital()]);
        let mut b = Catalog::new();
        b.insert("Math", "Algebra", vec![capital(), capital()]);
        a.merge(b);
        assert_eq!(a.questions("Math", "Algebra").map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_retain_valid_keeps_empty_topics() {
        let mut catalog = Catalog::new();
        catalog.insert("Math", "Broken", vec![Question::new("?", &["a"], "a")]);
        catalog.insert("Math", "Algebra", vec![capital()]);
        let rejected = catalog.retain_valid();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "Math");
        assert_eq!(rejected[0].1, "Broken");
        assert_eq!(catalog.questions("Math", "Broken").map(<[_]>::len), Some(0));
        assert_eq!(catalog.topics("Math"), vec!["Algebra", "Broken"]);
    }

    #[test]
    fn test_catalog_json_shape() {
        let json = r#"{"Math":{"Algebra":[{"question":"1+1?","options":["1","2"],"answer":"2"}]}}"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        let qs = catalog.questions("Math", "Algebra").unwrap();
        assert_eq!(qs[0].text, "1+1?");
        assert_eq!(qs[0].correct_answer, "2");
    }
}
