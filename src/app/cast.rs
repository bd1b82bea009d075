use crate::core::ranking::Ranking;
use crate::core::session::{describe_invalid, ConfirmationPrompt, SubmissionReceipt, VotingSession};
use crate::core::{AssemblyMember, CandidateId, Category, MemberId, VotingApi};
use crate::utils::error::{Result, VotingError};
use std::io::{BufRead, Write};

/// Candidates picked in one category, e.g. `principales=3,5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub category: Category,
    pub candidate_ids: Vec<CandidateId>,
}

pub fn parse_selection(raw: &str) -> Result<Selection> {
    let (category, ids) = raw.split_once('=').ok_or_else(|| {
        VotingError::validation(format!(
            "Selection '{}' must look like CATEGORY=ID[,ID...]",
            raw
        ))
    })?;

    let category: Category = category.parse()?;
    let candidate_ids = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<CandidateId>().map_err(|_| {
                VotingError::validation(format!("Candidate id '{}' is not a number", id))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Selection {
        category,
        candidate_ids,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CastRequest {
    pub voter_id: MemberId,
    pub selections: Vec<Selection>,
    pub abstentions: Vec<Category>,
}

pub trait Confirmer {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> Result<bool>;
}

/// Accepts every prompt (`--yes`).
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> Result<bool> {
        tracing::debug!("Auto-confirming ballot for voter {}", prompt.voter_id);
        Ok(true)
    }
}

/// Shows the prompt and reads a yes/no answer.
pub struct PromptConfirmer<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> PromptConfirmer<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> Confirmer for PromptConfirmer<R, W> {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> Result<bool> {
        write!(self.writer, "{}", prompt)?;
        write!(self.writer, "¿Confirmar voto? [s/N] ")?;
        self.writer.flush()?;

        let mut answer = String::new();
        self.reader.read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "s" | "si" | "sí" | "y" | "yes"
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastOutcome {
    Submitted(SubmissionReceipt),
    Declined,
}

fn resolve_voter(roster: &[AssemblyMember], voter_id: MemberId) -> Result<AssemblyMember> {
    if roster.is_empty() {
        return Ok(AssemblyMember::new(voter_id, "", "", false));
    }
    roster
        .iter()
        .find(|m| m.id == voter_id)
        .cloned()
        .ok_or_else(|| VotingError::validation(format!("Member {} is not in the roster", voter_id)))
}

pub async fn cast_ballot(
    api: &dyn VotingApi,
    roster: &[AssemblyMember],
    request: &CastRequest,
    confirmer: &mut dyn Confirmer,
) -> Result<CastOutcome> {
    let member = resolve_voter(roster, request.voter_id)?;
    let mut session = VotingSession::new();
    if !session.select_voter(&member) {
        return Err(VotingError::validation(format!(
            "{} has already voted",
            member.display_name()
        )));
    }

    for selection in &request.selections {
        if request.abstentions.contains(&selection.category) {
            tracing::warn!(
                "⚠️ {} is abstained; its selections will be discarded",
                selection.category
            );
        }
        for id in &selection.candidate_ids {
            if !session.toggle_candidate(selection.category, *id, true) {
                tracing::warn!(
                    "⚠️ Candidate {} ignored in {} (limit {} reached or already selected)",
                    id,
                    selection.category,
                    selection.category.limits().maximum
                );
            }
        }
    }
    for category in &request.abstentions {
        session.set_abstention(*category, true);
    }

    if !session.can_submit() {
        return Err(VotingError::validation(format!(
            "Ballot is incomplete: {}",
            describe_invalid(&session.invalid_categories())
        )));
    }
    if session.all_abstained() {
        tracing::info!("Se ha abstenido de todas las categorías.");
    }

    let candidates = match api.fetch_ranking().await {
        Ok(records) => Ranking::new(records).candidates(),
        Err(e) => {
            tracing::warn!("⚠️ Candidate names unavailable: {}", e);
            Vec::new()
        }
    };

    let prompt = session
        .open_confirmation(&candidates)
        .ok_or_else(|| VotingError::validation("Ballot cannot be confirmed"))?;

    if !confirmer.confirm(&prompt)? {
        session.cancel_confirmation();
        tracing::info!("Ballot for voter {} was not confirmed", request.voter_id);
        return Ok(CastOutcome::Declined);
    }

    let receipt = session.confirm(api).await?;
    Ok(CastOutcome::Submitted(receipt))
}
