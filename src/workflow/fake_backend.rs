//! 内存版测评后端，仅用于单元测试

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::clients::AssessmentBackend;
use crate::error::{AppError, AppResult};
use crate::models::{CandidateResponse, NextStep, PossibleResponse, Question, TestMetadata};

#[derive(Default)]
struct FakeState {
    answered: HashSet<String>,
    submissions: Vec<CandidateResponse>,
    fail_next: bool,
    fail_submit: bool,
    failing_questions: HashSet<String>,
    next_calls: usize,
}

pub struct FakeBackend {
    test: Option<TestMetadata>,
    order: Vec<String>,
    questions: HashMap<String, Question>,
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new(questions: Vec<(&str, Question)>) -> Self {
        Self {
            test: Some(TestMetadata {
                title: "Test technique".to_string(),
                number_of_questions: Some(questions.len() as u32),
                ..TestMetadata::default()
            }),
            order: questions.iter().map(|(id, _)| id.to_string()).collect(),
            questions: questions
                .into_iter()
                .map(|(id, q)| (id.to_string(), q))
                .collect(),
            state: Mutex::new(FakeState::default()),
        }
    }

    /// q1 为选择题，q2 为自由文本题
    pub fn two_questions(time: u32) -> Self {
        Self::new(vec![
            ("q1", mcq("Combien font $1+1$ ?", &["1", "2"], time)),
            ("q2", free_text("Expliquer le borrow checker", time)),
        ])
    }

    pub fn without_test(mut self) -> Self {
        self.test = None;
        self
    }

    pub fn mark_answered(&self, id: &str) {
        self.state.lock().unwrap().answered.insert(id.to_string());
    }

    pub fn fail_next_question(&self, fail: bool) {
        self.state.lock().unwrap().fail_next = fail;
    }

    pub fn fail_submit(&self, fail: bool) {
        self.state.lock().unwrap().fail_submit = fail;
    }

    pub fn fail_question(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_questions
            .insert(id.to_string());
    }

    pub fn submissions(&self) -> Vec<CandidateResponse> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn next_calls(&self) -> usize {
        self.state.lock().unwrap().next_calls
    }
}

pub fn mcq(instruction: &str, options: &[&str], time: u32) -> Question {
    Question {
        instruction: instruction.to_string(),
        question_type: "MCQ".to_string(),
        possible_responses: options
            .iter()
            .enumerate()
            .map(|(i, o)| PossibleResponse {
                id: Some(format!("opt{}", i)),
                possible_response: o.to_string(),
            })
            .collect(),
        text_type: None,
        time: Some(time),
    }
}

pub fn free_text(instruction: &str, time: u32) -> Question {
    Question {
        instruction: instruction.to_string(),
        question_type: "open".to_string(),
        time: Some(time),
        ..Question::default()
    }
}

pub fn code(instruction: &str, time: u32) -> Question {
    Question {
        text_type: Some("code".to_string()),
        ..free_text(instruction, time)
    }
}

fn unavailable(endpoint: &str) -> AppError {
    AppError::bad_response(endpoint, 503, None)
}

#[async_trait]
impl AssessmentBackend for FakeBackend {
    async fn fetch_test(&self, test_id: &str) -> AppResult<TestMetadata> {
        self.test
            .clone()
            .ok_or_else(|| AppError::bad_response(format!("/result/test/{}", test_id), 404, None))
    }

    async fn next_question(
        &self,
        _session_id: &str,
        current_question_id: Option<&str>,
    ) -> AppResult<NextStep> {
        let mut state = self.state.lock().unwrap();
        state.next_calls += 1;
        if state.fail_next {
            return Err(unavailable("nextQuestion"));
        }

        let next = self
            .order
            .iter()
            .find(|id| Some(id.as_str()) != current_question_id && !state.answered.contains(*id));
        Ok(NextStep::from_raw(next.map(String::as_str)))
    }

    async fn fetch_question(&self, question_id: &str, _session_id: &str) -> AppResult<Question> {
        let state = self.state.lock().unwrap();
        if state.failing_questions.contains(question_id) {
            return Err(unavailable("question"));
        }
        self.questions
            .get(question_id)
            .cloned()
            .ok_or_else(|| AppError::bad_response("question", 404, None))
    }

    async fn submit_response(&self, response: &CandidateResponse) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_submit {
            return Err(unavailable("response"));
        }
        state.answered.insert(response.question_id.clone());
        state.submissions.push(response.clone());
        Ok(())
    }
}
