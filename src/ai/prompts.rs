/// Prompt asking for a bare percentage. Inputs are expected to be truncated
/// already.
pub fn scoring_prompt(question: &str, correct_answer: &str, user_answer: &str) -> String {
    format!(
        r#"You are grading an exam answer.

Question: {question}
Correct Answer: {correct_answer}
User's Answer: {user_answer}

Judge whether the user's answer is semantically correct. Do not require the
exact wording of the correct answer; synonyms, paraphrases and extra detail
that does not contradict it are acceptable.

Use these anchor points:
- 100: fully correct
- 70: mostly correct with minor omissions
- 50: partially correct
- 0: incorrect or irrelevant

Respond ONLY with the percentage as a number between 0 and 100. No words, no
explanation, no % sign."#
    )
}

/// Prompt asking for short, actionable feedback.
pub fn feedback_prompt(question: &str, correct_answer: &str, user_answer: &str) -> String {
    format!(
        r#"You are helping a student improve an exam answer.

Question: {question}
Correct Answer: {correct_answer}
User's Answer: {user_answer}

Give actionable feedback on how the user's answer could be improved, in at
most two lines. Do not add headings, titles or any preamble; start directly
with the feedback."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_prompt_embeds_inputs_and_anchors() {
        let prompt = scoring_prompt("What is 2+2?", "4", "four");
        assert!(prompt.contains("Question: What is 2+2?"));
        assert!(prompt.contains("Correct Answer: 4"));
        assert!(prompt.contains("User's Answer: four"));
        for anchor in ["100:", "70:", "50:", "0:"] {
            assert!(prompt.contains(anchor), "missing anchor {}", anchor);
        }
        assert!(prompt.contains("semantically correct"));
    }

    #[test]
    fn test_feedback_prompt_limits_length_and_preamble() {
        let prompt = feedback_prompt("Q", "A", "B");
        assert!(prompt.contains("most two lines"));
        assert!(prompt.contains("Do not add headings"));
        assert!(prompt.contains("User's Answer: B"));
    }
}
