//! Predefined question/answer pairs.
//!
//! A handful of frequently asked questions are answered from a curated
//! set without engaging the routing loop at all. Lookup is exact-match
//! after normalization (lowercase, collapsed whitespace, trailing
//! punctuation stripped).

use std::collections::HashMap;

/// Curated quick answers consulted before routing.
pub struct PredefinedAnswers {
    answers: HashMap<String, String>,
}

impl PredefinedAnswers {
    /// Build the default curated set.
    pub fn new() -> Self {
        let mut answers = HashMap::new();
        for (question, answer) in DEFAULT_QAS {
            answers.insert(normalize(question), answer.to_string());
        }
        Self { answers }
    }

    /// An empty set (routing handles everything).
    pub fn empty() -> Self {
        Self {
            answers: HashMap::new(),
        }
    }

    /// Look up a quick answer for a question.
    pub fn lookup(&self, question: &str) -> Option<&str> {
        self.answers.get(&normalize(question)).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl Default for PredefinedAnswers {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase, collapse inner whitespace, strip trailing punctuation.
fn normalize(question: &str) -> String {
    question
        .trim()
        .trim_end_matches(['?', '!', '.'])
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

const DEFAULT_QAS: [(&str, &str); 3] = [
    (
        "What are the top universities in Malaysia?",
        "Malaysia's top public universities are Universiti Malaya (Kuala Lumpur), \
         Universiti Kebangsaan Malaysia (Bangi), Universiti Putra Malaysia (Serdang), \
         Universiti Sains Malaysia (Penang), and Universiti Teknologi Malaysia (Johor). \
         Leading private options include Monash University Malaysia, Sunway University, \
         Taylor's University, and Asia Pacific University. If you want rankings, tuition \
         fees, or details about a specific university or course, just ask!",
    ),
    (
        "What is the cost of living for a student in Malaysia?",
        "Students typically spend RM 1,150 - RM 2,850 (US$245 - US$615) per month: \
         accommodation RM 300-1,000, food RM 450-900, transport RM 100-250, utilities \
         RM 100-200, and personal expenses RM 200-500. Student hostels, local food \
         stalls, and public transport keep costs at the lower end.",
    ),
    (
        "How do I apply for a student visa in Malaysia?",
        "After receiving a university offer letter, the university applies for a Visa \
         Approval Letter (VAL) with the Malaysian Immigration Department on your behalf. \
         You'll need passport photos, a passport copy, academic transcripts, and the \
         offer letter, plus the visa fees. Once the VAL is approved you get a \
         single-entry visa from the Malaysian embassy in your country, and your student \
         pass is endorsed after arrival. Start early: the process takes several weeks.",
    ),
];
