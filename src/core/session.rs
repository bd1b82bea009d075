use crate::core::ballot::{BallotValidator, CategoryState};
use crate::domain::model::{AssemblyMember, Ballot, Candidate, CandidateId, Category, MemberId};
use crate::domain::ports::VotingApi;
use crate::utils::error::{Result, VotingError};
use chrono::{DateTime, Utc};
use std::fmt;

/// What the voter is asked to confirm before the ballot is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub voter_id: MemberId,
    pub entries: Vec<PromptEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEntry {
    pub category: Category,
    pub line: PromptLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptLine {
    Abstained,
    /// (faculty code, candidate name) for every selected id found in the snapshot.
    Candidates(Vec<(String, String)>),
}

impl fmt::Display for ConfirmationPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Por favor confirme su selección de candidatos:")?;
        for entry in &self.entries {
            writeln!(f, "{}:", entry.category)?;
            match &entry.line {
                PromptLine::Abstained => writeln!(f, "    Abstención")?,
                PromptLine::Candidates(candidates) => {
                    for (code, name) in candidates {
                        writeln!(f, "    {}. {}", code, name)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub voter_id: MemberId,
    pub ballot: Ballot,
    pub submitted_at: DateTime<Utc>,
}

/// A voter's in-progress ballot plus the confirmation and submission gates.
#[derive(Debug, Default)]
pub struct VotingSession {
    voter: Option<MemberId>,
    validator: BallotValidator,
    confirming: bool,
    in_flight: bool,
}

impl VotingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members who already voted cannot act as the voter.
    pub fn select_voter(&mut self, member: &AssemblyMember) -> bool {
        if member.has_voted {
            tracing::warn!("⚠️ {} has already voted", member.display_name());
            return false;
        }
        if !self.ensure_editable() {
            return false;
        }
        // 只有換人時才清空，第一次選擇投票人保留已填的選票
        if matches!(self.voter, Some(prev) if prev != member.id) {
            self.validator.reset();
        }
        self.voter = Some(member.id);
        tracing::debug!("Voter set to {}", member.id);
        true
    }

    pub fn clear_voter(&mut self) -> bool {
        if !self.ensure_editable() {
            return false;
        }
        self.voter = None;
        self.validator.reset();
        true
    }

    pub fn voter(&self) -> Option<MemberId> {
        self.voter
    }

    pub fn toggle_candidate(
        &mut self,
        category: Category,
        candidate_id: CandidateId,
        selected: bool,
    ) -> bool {
        self.ensure_editable() && self.validator.toggle_candidate(category, candidate_id, selected)
    }

    pub fn set_abstention(&mut self, category: Category, abstain: bool) -> bool {
        if !self.ensure_editable() {
            return false;
        }
        self.validator.set_abstention(category, abstain);
        true
    }

    /// 送出中不可修改；已開啟的確認視窗在修改前關閉，需重新確認
    fn ensure_editable(&mut self) -> bool {
        if self.in_flight {
            tracing::debug!("Ballot is being submitted; change refused");
            return false;
        }
        if self.confirming {
            tracing::debug!("Ballot changed; confirmation prompt closed");
            self.confirming = false;
        }
        true
    }

    pub fn is_category_valid(&self, category: Category) -> bool {
        self.validator.is_category_valid(category)
    }

    pub fn category_state(&self, category: Category) -> CategoryState {
        self.validator.state(category)
    }

    pub fn selected(&self, category: Category) -> &[CandidateId] {
        self.validator.selected(category)
    }

    pub fn is_abstained(&self, category: Category) -> bool {
        self.validator.is_abstained(category)
    }

    pub fn invalid_categories(&self) -> Vec<Category> {
        self.validator.invalid_categories()
    }

    pub fn all_abstained(&self) -> bool {
        self.validator.all_abstained()
    }

    pub fn can_submit(&self) -> bool {
        self.voter.is_some() && self.validator.all_valid()
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// Opens the confirmation prompt; `None` while the ballot is not submittable.
    pub fn open_confirmation(&mut self, candidates: &[Candidate]) -> Option<ConfirmationPrompt> {
        if !self.can_submit() {
            return None;
        }
        let voter_id = self.voter?;
        self.confirming = true;

        let entries = Category::ALL
            .into_iter()
            .map(|category| {
                let line = if self.validator.is_abstained(category) {
                    PromptLine::Abstained
                } else {
                    PromptLine::Candidates(
                        self.validator
                            .selected(category)
                            .iter()
                            .filter_map(|id| candidates.iter().find(|c| c.id == *id))
                            .map(|c| (c.faculty_code.clone(), c.name.clone()))
                            .collect(),
                    )
                };
                PromptEntry { category, line }
            })
            .collect();

        Some(ConfirmationPrompt { voter_id, entries })
    }

    pub fn cancel_confirmation(&mut self) {
        self.confirming = false;
    }

    /// Marks a submission as in flight and returns the ballot to send.
    pub fn begin_submission(&mut self) -> Result<Ballot> {
        if self.in_flight {
            return Err(VotingError::validation("A ballot submission is already in progress"));
        }
        if !self.confirming {
            return Err(VotingError::validation("The ballot has not been confirmed"));
        }
        let voter_id = match self.voter {
            Some(id) if self.validator.all_valid() => id,
            Some(_) => {
                return Err(VotingError::validation(format!(
                    "Invalid categories: {}",
                    describe_invalid(&self.validator.invalid_categories())
                )))
            }
            None => return Err(VotingError::validation("No voter selected")),
        };

        self.in_flight = true;
        Ok(self.validator.build_ballot(voter_id))
    }

    /// Success resets the whole session; failure keeps everything for a retry.
    pub fn finish_submission(&mut self, outcome: &Result<()>) {
        self.in_flight = false;
        match outcome {
            Ok(()) => {
                self.voter = None;
                self.validator.reset();
                self.confirming = false;
            }
            Err(e) => {
                tracing::error!("❌ Ballot submission failed: {}", e);
            }
        }
    }

    pub async fn confirm(&mut self, api: &dyn VotingApi) -> Result<SubmissionReceipt> {
        let ballot = self.begin_submission()?;
        let voter_id = ballot.voter_id;

        let guard = InFlightGuard { session: self };
        let outcome = api.register_ballot(&ballot).await;
        guard.session.finish_submission(&outcome);
        drop(guard);
        outcome?;

        tracing::info!("✅ Ballot registered for voter {}", voter_id);
        Ok(SubmissionReceipt {
            voter_id,
            ballot,
            submitted_at: Utc::now(),
        })
    }
}

/// Clears the in-flight flag if `confirm` is dropped before the API answers.
struct InFlightGuard<'a> {
    session: &'a mut VotingSession,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.session.in_flight {
            tracing::warn!("⚠️ Ballot submission abandoned before a response");
            self.session.in_flight = false;
        }
    }
}

pub fn describe_invalid(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| {
            let limits = c.limits();
            format!("{} ({}-{})", c, limits.minimum, limits.maximum)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CategoryChoice, RankingRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockApi {
        status: Option<u16>,
        hang: bool,
        received: Mutex<Vec<Ballot>>,
    }

    impl MockApi {
        fn accepting() -> Self {
            Self {
                status: None,
                hang: false,
                received: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(status: u16) -> Self {
            Self {
                status: Some(status),
                ..Self::accepting()
            }
        }

        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::accepting()
            }
        }
    }

    #[async_trait]
    impl VotingApi for MockApi {
        async fn fetch_ranking(&self) -> Result<Vec<RankingRecord>> {
            Ok(vec![])
        }

        async fn register_ballot(&self, ballot: &Ballot) -> Result<()> {
            self.received.lock().unwrap().push(ballot.clone());
            if self.hang {
                std::future::pending::<()>().await;
            }
            match self.status {
                None => Ok(()),
                Some(status) => Err(VotingError::SubmissionError {
                    status,
                    body: "rechazado".to_string(),
                }),
            }
        }
    }

    fn member(id: MemberId) -> AssemblyMember {
        AssemblyMember::new(id, "Ana", "Quispe", false)
    }

    fn candidate(id: CandidateId, category: Category, code: &str, name: &str) -> Candidate {
        Candidate {
            id,
            name: name.to_string(),
            category,
            faculty_code: code.to_string(),
            votes: 0,
        }
    }

    fn ready_session() -> VotingSession {
        let mut session = VotingSession::new();
        assert!(session.select_voter(&member(12)));
        session.toggle_candidate(Category::SeniorFaculty, 1, true);
        session.toggle_candidate(Category::AssociateFaculty, 2, true);
        session.toggle_candidate(Category::AssistantFaculty, 3, true);
        session.set_abstention(Category::Students, true);
        session
    }

    #[test]
    fn test_can_submit_requires_voter() {
        let mut session = VotingSession::new();
        for category in Category::ALL {
            session.set_abstention(category, true);
        }
        assert!(!session.can_submit());
        session.select_voter(&member(1));
        assert!(session.can_submit());
    }

    #[test]
    fn test_choosing_voter_after_filling_ballot_keeps_it() {
        let mut session = VotingSession::new();
        session.toggle_candidate(Category::SeniorFaculty, 1, true);
        session.toggle_candidate(Category::AssociateFaculty, 2, true);
        session.set_abstention(Category::AssistantFaculty, true);
        session.set_abstention(Category::Students, true);

        assert!(session.select_voter(&member(12)));

        assert_eq!(session.selected(Category::SeniorFaculty), &[1]);
        assert_eq!(session.selected(Category::AssociateFaculty), &[2]);
        assert!(session.is_abstained(Category::AssistantFaculty));
        assert!(session.can_submit());
    }

    #[test]
    fn test_can_submit_false_with_empty_category() {
        let mut session = ready_session();
        session.set_abstention(Category::Students, false);
        assert!(!session.can_submit());
        assert!(session.open_confirmation(&[]).is_none());
        assert!(!session.is_confirming());
    }

    #[test]
    fn test_voter_who_already_voted_is_refused() {
        let mut session = VotingSession::new();
        let voted = AssemblyMember::new(3, "Luis", "Huamán", true);
        assert!(!session.select_voter(&voted));
        assert_eq!(session.voter(), None);
    }

    #[test]
    fn test_changing_voter_resets_selections() {
        let mut session = ready_session();
        session.select_voter(&member(13));
        for category in Category::ALL {
            assert_eq!(session.category_state(category), CategoryState::Unset);
        }

        // 同一位投票人再選一次不會清空
        session.toggle_candidate(Category::Students, 8, true);
        session.select_voter(&member(13));
        assert_eq!(session.selected(Category::Students), &[8]);
    }

    #[test]
    fn test_confirmation_prompt_resolves_candidates() {
        let mut session = ready_session();
        let candidates = vec![
            candidate(1, Category::SeniorFaculty, "03", "Carlos Rojas"),
            candidate(2, Category::AssociateFaculty, "11", "María Flores"),
        ];

        let prompt = session.open_confirmation(&candidates).unwrap();

        assert!(session.is_confirming());
        assert_eq!(prompt.voter_id, 12);
        assert_eq!(
            prompt.entries[0].line,
            PromptLine::Candidates(vec![("03".to_string(), "Carlos Rojas".to_string())])
        );
        // id 3 不在候選人清單中
        assert_eq!(prompt.entries[2].line, PromptLine::Candidates(vec![]));
        assert_eq!(prompt.entries[3].line, PromptLine::Abstained);

        let text = prompt.to_string();
        assert!(text.contains("Docentes Principales:"));
        assert!(text.contains("03. Carlos Rojas"));
        assert!(text.contains("Abstención"));
    }

    #[test]
    fn test_cancel_confirmation_keeps_state() {
        let mut session = ready_session();
        session.open_confirmation(&[]);
        session.cancel_confirmation();

        assert!(!session.is_confirming());
        assert_eq!(session.voter(), Some(12));
        assert_eq!(session.selected(Category::SeniorFaculty), &[1]);
        assert!(session.is_abstained(Category::Students));
    }

    #[test]
    fn test_begin_submission_requires_confirmation() {
        let mut session = ready_session();
        assert!(session.begin_submission().is_err());
    }

    #[test]
    fn test_double_submission_is_refused() {
        let mut session = ready_session();
        session.open_confirmation(&[]);
        let ballot = session.begin_submission().unwrap();
        assert_eq!(ballot.voter_id, 12);
        assert!(session.is_submitting());

        let err = session.begin_submission().unwrap_err();
        assert!(err.to_string().contains("already in progress"));
    }

    #[test]
    fn test_editing_after_prompt_requires_new_confirmation() {
        let mut session = ready_session();
        assert!(session.open_confirmation(&[]).is_some());

        assert!(session.toggle_candidate(Category::SeniorFaculty, 1, false));
        assert!(session.toggle_candidate(Category::SeniorFaculty, 99, true));

        assert!(!session.is_confirming());
        let err = session.begin_submission().unwrap_err();
        assert!(err.to_string().contains("not been confirmed"));
        assert!(!session.is_submitting());

        // 重新確認後送出的是新的選票
        let prompt = session.open_confirmation(&[]).unwrap();
        assert_eq!(prompt.entries[0].line, PromptLine::Candidates(vec![]));
        let ballot = session.begin_submission().unwrap();
        assert_eq!(
            ballot.choice(Category::SeniorFaculty),
            Some(&CategoryChoice::Selected(vec![99]))
        );
    }

    #[test]
    fn test_abstaining_or_switching_voter_closes_prompt() {
        let mut session = ready_session();
        session.open_confirmation(&[]);
        assert!(session.set_abstention(Category::AssistantFaculty, true));
        assert!(!session.is_confirming());

        session.open_confirmation(&[]);
        assert!(session.select_voter(&member(13)));
        assert!(!session.is_confirming());
        assert!(session.begin_submission().is_err());
    }

    #[test]
    fn test_changes_refused_while_submitting() {
        let mut session = ready_session();
        session.open_confirmation(&[]);
        let ballot = session.begin_submission().unwrap();

        assert!(!session.toggle_candidate(Category::SeniorFaculty, 1, false));
        assert!(!session.toggle_candidate(Category::Students, 7, true));
        assert!(!session.set_abstention(Category::SeniorFaculty, true));
        assert!(!session.select_voter(&member(13)));
        assert!(!session.clear_voter());

        assert!(session.is_submitting());
        assert!(session.is_confirming());
        assert_eq!(session.voter(), Some(12));
        assert_eq!(session.selected(Category::SeniorFaculty), &[1]);
        assert!(session.is_abstained(Category::Students));
        assert_eq!(session.validator.build_ballot(12), ballot);
    }

    #[tokio::test]
    async fn test_dropped_confirm_releases_submission() {
        let api = MockApi::hanging();
        let mut session = ready_session();
        session.open_confirmation(&[]);

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), session.confirm(&api)).await;

        assert!(timed_out.is_err());
        assert_eq!(api.received.lock().unwrap().len(), 1);
        assert!(!session.is_submitting());
        assert!(session.is_confirming());
        assert_eq!(session.voter(), Some(12));

        let receipt = session.confirm(&MockApi::accepting()).await.unwrap();
        assert_eq!(receipt.voter_id, 12);
    }

    #[tokio::test]
    async fn test_successful_confirm_resets_everything() {
        let api = MockApi::accepting();
        let mut session = ready_session();
        session.open_confirmation(&[]);

        let receipt = session.confirm(&api).await.unwrap();

        assert_eq!(receipt.voter_id, 12);
        assert!(receipt.ballot.choice(Category::Students).unwrap().is_abstained());
        assert_eq!(api.received.lock().unwrap().len(), 1);
        assert_eq!(session.voter(), None);
        assert!(!session.is_confirming());
        assert!(!session.is_submitting());
        for category in Category::ALL {
            assert!(session.selected(category).is_empty());
            assert!(!session.is_abstained(category));
        }
    }

    #[tokio::test]
    async fn test_failed_confirm_preserves_state() {
        let api = MockApi::rejecting(400);
        let mut session = ready_session();
        session.open_confirmation(&[]);

        let err = session.confirm(&api).await.unwrap_err();

        match err {
            VotingError::SubmissionError { status, .. } => assert_eq!(status, 400),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.voter(), Some(12));
        assert!(session.is_confirming());
        assert!(!session.is_submitting());
        assert_eq!(session.selected(Category::SeniorFaculty), &[1]);
        assert!(session.is_abstained(Category::Students));

        // 重試仍可送出
        let retry = session.confirm(&MockApi::accepting()).await;
        assert!(retry.is_ok());
    }

    #[test]
    fn test_describe_invalid() {
        assert_eq!(
            describe_invalid(&[Category::AssociateFaculty, Category::Students]),
            "Docentes Asociados (1-2), Estudiantes (1-3)"
        );
    }
}
