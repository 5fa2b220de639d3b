//! Lesson session controller
//!
//! Drives one open-module interaction: lazy content generation behind a
//! loading state, the quiz, the assignment review, and completion.
//!
//! Each open (and each retry) takes a new epoch. A generation result is only
//! applied when its ticket still carries the current epoch, so content that
//! resolves after the lesson was closed or another module was opened is
//! dropped instead of being written to the store.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::provider::ContentService;
use crate::store::{ProgressionStore, StatusChange};
use crate::types::{AssignmentFeedback, Difficulty, ModuleContent, ModuleStatus, QuizQuestion};

/// Captions cycled while lesson content is being generated
pub const LOADING_CAPTIONS: [&str; 5] = [
    "Analyzing topic...",
    "Drafting tutorial content...",
    "Generating code examples...",
    "Creating knowledge check...",
    "Finalizing lesson...",
];

/// Cosmetic caption rotation driven by a background task.
///
/// The task is aborted on [`CaptionTicker::stop`] and on drop. Outside a
/// tokio runtime (or with a zero interval) the caption stays on the first
/// entry.
pub struct CaptionTicker {
    rx: watch::Receiver<String>,
    handle: Option<JoinHandle<()>>,
}

impl CaptionTicker {
    pub fn start(interval: Duration) -> Self {
        let (tx, rx) = watch::channel(LOADING_CAPTIONS[0].to_string());

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(runtime) if !interval.is_zero() => Some(runtime.spawn(async move {
                let mut step = 0usize;
                loop {
                    tokio::time::sleep(interval).await;
                    step = (step + 1) % LOADING_CAPTIONS.len();
                    if tx.send(LOADING_CAPTIONS[step].to_string()).is_err() {
                        break;
                    }
                }
            })),
            _ => None,
        };

        Self { rx, handle }
    }

    pub fn current(&self) -> String {
        self.rx.borrow().clone()
    }

    /// Receiver for rendering the caption elsewhere (e.g. a spinner)
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for CaptionTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Where the open lesson's content stands
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading { caption: String },
    Ready,
    Failed(String),
}

/// Everything needed to generate content for one open, stamped with the epoch
/// it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub index: usize,
    pub epoch: u64,
    pub path_id: String,
    pub topic: String,
    pub module_title: String,
    pub difficulty: Difficulty,
    pub tech_stack: Option<String>,
}

/// Result of a submitted quiz. A perfect score earns no extra XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: usize,
    pub total: usize,
    pub perfect: bool,
}

/// Count of questions whose selection equals the correct answer.
/// Unanswered questions score nothing.
pub fn score_quiz(questions: &[QuizQuestion], selections: &[Option<usize>]) -> usize {
    questions
        .iter()
        .zip(selections)
        .filter(|(q, selected)| selected.is_some_and(|s| q.is_correct(s)))
        .count()
}

/// One selection per question until the set is submitted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizState {
    selections: Vec<Option<usize>>,
    submitted: bool,
}

impl QuizState {
    pub fn new(questions: usize) -> Self {
        Self {
            selections: vec![None; questions],
            submitted: false,
        }
    }

    pub fn selections(&self) -> &[Option<usize>] {
        &self.selections
    }

    pub fn selection(&self, question: usize) -> Option<usize> {
        self.selections.get(question).copied().flatten()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Record `option` for `question`, replacing any earlier choice
    pub fn select(&mut self, question: usize, option: usize) -> bool {
        if self.submitted {
            return false;
        }
        match self.selections.get_mut(question) {
            Some(slot) => {
                *slot = Some(option);
                true
            }
            None => false,
        }
    }

    /// Freeze the selections and score them. Only the first call scores.
    pub fn submit(&mut self, questions: &[QuizQuestion]) -> Option<QuizOutcome> {
        if self.submitted {
            return None;
        }
        self.submitted = true;
        let score = score_quiz(questions, &self.selections);
        let total = questions.len();
        Some(QuizOutcome {
            score,
            total,
            perfect: total > 0 && score == total,
        })
    }
}

pub struct LessonSession {
    caption_interval: Duration,
    open: Option<usize>,
    /// Path the open lesson belongs to
    open_path: Option<String>,
    epoch: u64,
    state: LoadState,
    quiz: QuizState,
    submission: String,
    feedback: Option<AssignmentFeedback>,
    ticker: Option<CaptionTicker>,
}

impl LessonSession {
    pub fn new(caption_interval: Duration) -> Self {
        Self {
            caption_interval,
            open: None,
            open_path: None,
            epoch: 0,
            state: LoadState::Idle,
            quiz: QuizState::default(),
            submission: String::new(),
            feedback: None,
            ticker: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(Duration::from_millis(config.caption_interval_ms))
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Current load state, with the live caption while loading
    pub fn load_state(&self) -> LoadState {
        match (&self.state, &self.ticker) {
            (LoadState::Loading { .. }, Some(ticker)) => LoadState::Loading {
                caption: ticker.current(),
            },
            (state, _) => state.clone(),
        }
    }

    /// Caption updates for the in-flight generation, if any
    pub fn captions(&self) -> Option<watch::Receiver<String>> {
        self.ticker.as_ref().map(CaptionTicker::subscribe)
    }

    pub fn quiz(&self) -> &QuizState {
        &self.quiz
    }

    pub fn submission(&self) -> &str {
        &self.submission
    }

    pub fn feedback(&self) -> Option<&AssignmentFeedback> {
        self.feedback.as_ref()
    }

    /// Cached content of the open module
    pub fn content<'a>(&self, store: &'a ProgressionStore) -> Option<&'a ModuleContent> {
        let index = self.open?;
        store.active_path()?.modules.get(index)?.content.as_ref()
    }

    /// Open module `index`.
    ///
    /// Locked or missing modules are ignored and leave the session as it
    /// was. A module with cached content becomes ready immediately and
    /// returns `None`; otherwise the session enters the loading state and the
    /// returned ticket describes what to generate.
    pub fn begin_open(&mut self, store: &ProgressionStore, index: usize) -> Option<FetchTicket> {
        let path = store.active_path()?;
        let Some(module) = path.modules.get(index) else {
            debug!("open_module({}) ignored: no such module", index);
            return None;
        };
        if module.is_locked() {
            debug!("open_module({}) ignored: module is locked", index);
            return None;
        }

        self.close();
        self.open = Some(index);
        self.open_path = Some(path.id.clone());

        if let Some(content) = &module.content {
            self.quiz = QuizState::new(content.quizzes.len());
            self.state = LoadState::Ready;
            return None;
        }
        self.issue_ticket(store, index)
    }

    /// Apply generated content for `ticket`. Returns whether it was stored.
    ///
    /// Results for a closed lesson, a different module or a superseded retry
    /// are discarded. If the path itself was replaced or abandoned while
    /// loading, the lesson fails instead.
    pub fn finish_open(
        &mut self,
        store: &mut ProgressionStore,
        ticket: FetchTicket,
        content: ModuleContent,
    ) -> bool {
        if ticket.epoch != self.epoch || self.open != Some(ticket.index) {
            debug!(
                "Discarding stale content for module {} (epoch {}, current {})",
                ticket.index, ticket.epoch, self.epoch
            );
            return false;
        }

        self.stop_ticker();
        let same_path = store.active_path().is_some_and(|p| p.id == ticket.path_id);
        let questions = content.quizzes.len();
        if same_path && store.save_module_content(ticket.index, content) {
            self.quiz = QuizState::new(questions);
            self.state = LoadState::Ready;
            true
        } else {
            warn!("Generated content for module {} has no path to attach to", ticket.index);
            self.state = LoadState::Failed(
                "The learning path changed before the lesson finished loading.".to_string(),
            );
            false
        }
    }

    /// Open module `index`, generating its content when none is cached.
    /// Returns whether the module is open and ready afterwards.
    pub async fn open_module(
        &mut self,
        store: &mut ProgressionStore,
        service: &ContentService,
        index: usize,
    ) -> bool {
        match self.begin_open(store, index) {
            Some(ticket) => self.fetch(store, service, ticket).await,
            None => self.open == Some(index) && self.state == LoadState::Ready,
        }
    }

    /// Start regenerating the open module's content. The result replaces
    /// whatever is cached.
    ///
    /// Refused when the path the lesson was opened on is gone or the module
    /// is locked on it.
    pub fn begin_retry(&mut self, store: &ProgressionStore) -> Option<FetchTicket> {
        let index = self.open?;
        let path = store.active_path()?;
        if self.open_path.as_deref() != Some(path.id.as_str()) {
            debug!("retry ignored: lesson belongs to a path that is no longer active");
            return None;
        }
        if path.modules.get(index).map_or(true, |m| m.is_locked()) {
            debug!("retry ignored: module {} is locked", index);
            return None;
        }
        self.stop_ticker();
        self.quiz = QuizState::default();
        self.feedback = None;
        self.issue_ticket(store, index)
    }

    pub async fn retry(&mut self, store: &mut ProgressionStore, service: &ContentService) -> bool {
        match self.begin_retry(store) {
            Some(ticket) => self.fetch(store, service, ticket).await,
            None => false,
        }
    }

    /// Leave the lesson. Any in-flight generation becomes stale.
    pub fn close(&mut self) {
        self.epoch += 1;
        self.stop_ticker();
        self.open = None;
        self.open_path = None;
        self.state = LoadState::Idle;
        self.quiz = QuizState::default();
        self.submission.clear();
        self.feedback = None;
    }

    pub fn select_answer(
        &mut self,
        store: &ProgressionStore,
        question: usize,
        option: usize,
    ) -> bool {
        let Some(content) = self.content(store) else {
            return false;
        };
        let valid = content
            .quizzes
            .get(question)
            .is_some_and(|q| option < q.options.len());
        valid && self.quiz.select(question, option)
    }

    /// Submit the quiz. Selections are read-only afterwards.
    pub fn submit_quiz(&mut self, store: &ProgressionStore) -> Option<QuizOutcome> {
        let questions = &self.content(store)?.quizzes;
        let outcome = self.quiz.submit(questions)?;
        info!("Quiz submitted: {}/{}", outcome.score, outcome.total);
        Some(outcome)
    }

    pub fn set_submission(&mut self, text: impl Into<String>) {
        self.submission = text.into();
    }

    /// Send the submission for review. The verdict is advisory and never
    /// blocks [`LessonSession::complete_module`].
    pub async fn submit_assignment(
        &mut self,
        store: &ProgressionStore,
        service: &ContentService,
    ) -> Option<&AssignmentFeedback> {
        if self.submission.trim().is_empty() {
            return None;
        }
        let assignment = self.content(store)?.assignment.as_ref()?;
        let feedback = service
            .evaluate_assignment(&assignment.title, &assignment.requirements, &self.submission)
            .await;
        info!("Assignment reviewed: {}", feedback.status);
        self.feedback = Some(feedback);
        self.feedback.as_ref()
    }

    /// Mark the open module completed and return to the path overview
    pub fn complete_module(&mut self, store: &mut ProgressionStore) -> Option<StatusChange> {
        let Some(index) = self.open else {
            warn!("complete_module ignored: no lesson open");
            return None;
        };
        let change = store.update_module_status(index, ModuleStatus::Completed);
        self.close();
        change
    }

    fn issue_ticket(&mut self, store: &ProgressionStore, index: usize) -> Option<FetchTicket> {
        let path = store.active_path()?;
        let module = path.modules.get(index)?;

        self.epoch += 1;
        let ticker = CaptionTicker::start(self.caption_interval);
        self.state = LoadState::Loading {
            caption: ticker.current(),
        };
        self.ticker = Some(ticker);

        Some(FetchTicket {
            index,
            epoch: self.epoch,
            path_id: path.id.clone(),
            topic: path.topic.clone(),
            module_title: module.title.clone(),
            difficulty: path.difficulty,
            tech_stack: path.tech_stack.clone(),
        })
    }

    async fn fetch(
        &mut self,
        store: &mut ProgressionStore,
        service: &ContentService,
        ticket: FetchTicket,
    ) -> bool {
        let content = service
            .generate_module_content(
                &ticket.topic,
                &ticket.module_title,
                ticket.difficulty,
                ticket.tech_stack.as_deref(),
            )
            .await;
        self.finish_open(store, ticket, content)
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{offline, OfflineProvider};
    use crate::store::MemoryStorage;
    use crate::types::FeedbackStatus;

    fn store_with_path() -> ProgressionStore {
        let mut store = ProgressionStore::init(Box::new(MemoryStorage::new()));
        store.create_path(offline::learning_path("Rust", Difficulty::Beginner, None));
        store
    }

    fn instant_service() -> ContentService {
        ContentService::offline(OfflineProvider::instant())
    }

    fn question(correct: usize) -> QuizQuestion {
        QuizQuestion {
            question: "?".to_string(),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_quiz_scores_matching_selections() {
        let questions = vec![question(1), question(1), question(2)];
        let mut quiz = QuizState::new(3);
        quiz.select(0, 1);
        quiz.select(1, 0);
        quiz.select(2, 2);

        let outcome = quiz.submit(&questions).unwrap();
        assert_eq!(outcome, QuizOutcome { score: 2, total: 3, perfect: false });
    }

    #[test]
    fn test_quiz_submit_is_irreversible() {
        let questions = vec![question(0), question(2)];
        let mut quiz = QuizState::new(2);
        quiz.select(0, 0);
        quiz.select(0, 1);
        quiz.select(0, 0);
        quiz.select(1, 2);

        let outcome = quiz.submit(&questions).unwrap();
        assert!(outcome.perfect);
        assert!(!quiz.select(1, 0));
        assert_eq!(quiz.selection(1), Some(2));
        assert!(quiz.submit(&questions).is_none());
    }

    #[test]
    fn test_unanswered_questions_score_nothing() {
        let questions = vec![question(0), question(0)];
        assert_eq!(score_quiz(&questions, &[Some(0), None]), 1);
        assert_eq!(score_quiz(&questions, &[None, None]), 0);
        assert!(!QuizState::new(2).select(5, 0));
    }

    #[test]
    fn test_locked_or_missing_module_is_ignored() {
        let store = store_with_path();
        let mut session = LessonSession::new(Duration::ZERO);

        assert!(session.begin_open(&store, 1).is_none());
        assert_eq!(session.open_index(), None);
        assert!(session.begin_open(&store, 42).is_none());
        assert_eq!(session.load_state(), LoadState::Idle);
        assert_eq!(session.epoch(), 0);
    }

    #[tokio::test]
    async fn test_open_module_generates_and_caches() {
        let mut store = store_with_path();
        let service = instant_service();
        let mut session = LessonSession::new(Duration::from_millis(2000));

        assert!(session.open_module(&mut store, &service, 0).await);
        assert_eq!(session.load_state(), LoadState::Ready);
        assert!(session.captions().is_none());
        let cached = store.active_path().unwrap().modules[0].content.clone();
        assert!(cached.is_some());

        // Reopening uses the cache
        session.close();
        assert!(session.begin_open(&store, 0).is_none());
        assert_eq!(session.open_index(), Some(0));
        assert_eq!(session.load_state(), LoadState::Ready);
        assert_eq!(session.content(&store), cached.as_ref());
    }

    #[test]
    fn test_result_after_close_is_discarded() {
        let mut store = store_with_path();
        let mut session = LessonSession::new(Duration::ZERO);

        let ticket = session.begin_open(&store, 0).unwrap();
        assert!(matches!(session.load_state(), LoadState::Loading { .. }));
        session.close();

        assert!(!session.finish_open(&mut store, ticket, offline::module_content("late", None)));
        assert!(store.active_path().unwrap().modules[0].content.is_none());
        assert_eq!(session.load_state(), LoadState::Idle);
    }

    #[test]
    fn test_result_for_previous_open_is_discarded() {
        let mut store = store_with_path();
        let mut session = LessonSession::new(Duration::ZERO);

        let first = session.begin_open(&store, 0).unwrap();
        let second = session.begin_open(&store, 0).unwrap();
        assert!(second.epoch > first.epoch);

        assert!(!session.finish_open(&mut store, first, offline::module_content("stale", None)));
        assert!(session.finish_open(&mut store, second, offline::module_content("fresh", None)));
        let content = store.active_path().unwrap().modules[0].content.as_ref().unwrap();
        assert!(content.overview.contains("fresh"));
    }

    #[test]
    fn test_replaced_path_fails_pending_open() {
        let mut store = store_with_path();
        let mut session = LessonSession::new(Duration::ZERO);
        let ticket = session.begin_open(&store, 0).unwrap();

        let mut other = offline::learning_path("Go", Difficulty::Advanced, None);
        other.id = "path-go".to_string();
        store.create_path(other);

        assert!(!session.finish_open(&mut store, ticket, offline::module_content("x", None)));
        assert!(store.active_path().unwrap().modules[0].content.is_none());
        assert!(matches!(session.load_state(), LoadState::Failed(_)));
    }

    #[test]
    fn test_retry_after_path_swap_leaves_new_path_alone() {
        let mut store = store_with_path();
        let mut session = LessonSession::new(Duration::ZERO);
        let first = session.begin_open(&store, 0).unwrap();
        session.finish_open(&mut store, first, offline::module_content("a", None));
        session.complete_module(&mut store);

        let ticket = session.begin_open(&store, 1).unwrap();
        let mut other = offline::learning_path("Go", Difficulty::Advanced, None);
        other.id = "path-go".to_string();
        store.create_path(other);
        assert!(!session.finish_open(&mut store, ticket, offline::module_content("x", None)));
        assert!(matches!(session.load_state(), LoadState::Failed(_)));

        assert!(session.begin_retry(&store).is_none());
        let module = &store.active_path().unwrap().modules[1];
        assert!(module.is_locked());
        assert!(module.content.is_none());
    }

    #[test]
    fn test_abandoned_path_fails_pending_open() {
        let mut store = store_with_path();
        let mut session = LessonSession::new(Duration::ZERO);
        let ticket = session.begin_open(&store, 0).unwrap();

        store.set_path(None);
        assert!(!session.finish_open(&mut store, ticket, offline::module_content("x", None)));
        assert!(store.active_path().is_none());
        assert!(matches!(session.load_state(), LoadState::Failed(_)));
        assert!(session.begin_retry(&store).is_none());
    }

    #[tokio::test]
    async fn test_retry_overwrites_cached_content() {
        let mut store = store_with_path();
        let mut session = LessonSession::new(Duration::ZERO);
        let ticket = session.begin_open(&store, 0).unwrap();
        session.finish_open(&mut store, ticket, offline::module_content("first", None));

        let retry = session.begin_retry(&store).unwrap();
        assert!(matches!(session.load_state(), LoadState::Loading { .. }));
        assert!(session.finish_open(&mut store, retry, offline::module_content("second", None)));
        let content = store.active_path().unwrap().modules[0].content.as_ref().unwrap();
        assert!(content.overview.contains("second"));

        assert!(session.retry(&mut store, &instant_service()).await);
        assert_eq!(session.load_state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_quiz_through_session() {
        let mut store = store_with_path();
        let service = instant_service();
        let mut session = LessonSession::new(Duration::ZERO);
        session.open_module(&mut store, &service, 0).await;

        let answers: Vec<usize> = session
            .content(&store)
            .unwrap()
            .quizzes
            .iter()
            .map(|q| q.correct_answer)
            .collect();
        assert!(!session.select_answer(&store, 0, 99));
        for (i, answer) in answers.iter().enumerate() {
            assert!(session.select_answer(&store, i, *answer));
        }

        let outcome = session.submit_quiz(&store).unwrap();
        assert!(outcome.perfect);
        assert_eq!(outcome.score, answers.len());
        assert!(session.submit_quiz(&store).is_none());
        assert!(!session.select_answer(&store, 0, 0));
    }

    #[tokio::test]
    async fn test_assignment_review_does_not_gate_completion() {
        let mut store = store_with_path();
        let service = instant_service();
        let mut session = LessonSession::new(Duration::ZERO);
        session.open_module(&mut store, &service, 0).await;

        assert!(session.submit_assignment(&store, &service).await.is_none());
        session.set_submission("def train(): pass");
        let feedback = session.submit_assignment(&store, &service).await.unwrap();
        assert_eq!(feedback.status, FeedbackStatus::Pass);

        let xp = store.profile().xp;
        let change = session.complete_module(&mut store).unwrap();
        assert_eq!(change.unlocked, Some(1));
        assert_eq!(store.profile().xp, xp + 100);
        assert_eq!(session.open_index(), None);
        assert!(session.feedback().is_none());
    }

    #[test]
    fn test_complete_without_open_lesson_is_ignored() {
        let mut store = store_with_path();
        let mut session = LessonSession::new(Duration::ZERO);
        assert!(session.complete_module(&mut store).is_none());
        assert!(!store.active_path().unwrap().modules[0].is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_caption_ticker_rotates_and_stops() {
        let mut ticker = CaptionTicker::start(Duration::from_millis(2000));
        assert_eq!(ticker.current(), LOADING_CAPTIONS[0]);
        assert!(ticker.is_running());

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(ticker.current(), LOADING_CAPTIONS[1]);
        tokio::time::sleep(Duration::from_millis(8000)).await;
        assert_eq!(ticker.current(), LOADING_CAPTIONS[0]);

        ticker.stop();
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(ticker.current(), LOADING_CAPTIONS[0]);
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_caption_ticker() {
        let store = store_with_path();
        let mut session = LessonSession::new(Duration::from_millis(2000));
        session.begin_open(&store, 0).unwrap();

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(
            session.load_state(),
            LoadState::Loading { caption: LOADING_CAPTIONS[1].to_string() }
        );
        let captions = session.captions().unwrap();

        session.close();
        assert!(session.captions().is_none());
        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(*captions.borrow(), LOADING_CAPTIONS[1]);
    }
}
