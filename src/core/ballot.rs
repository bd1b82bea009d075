use crate::domain::model::{
    Ballot, CandidateId, Category, CategoryChoice, CategoryVote, MemberId, PerCategory,
};

/// Where a single category stands while the voter fills the ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryState {
    Unset,
    Selecting(usize),
    Abstained,
}

/// Per-category selections and abstentions.
///
/// Both mutators live here so that "abstaining clears the selection" and
/// "no selection while abstained" are enforced in one place. Refused
/// mutations are not errors: they return `false` and leave state untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallotValidator {
    selections: PerCategory<Vec<CandidateId>>,
    abstentions: PerCategory<bool>,
    touched: PerCategory<bool>,
}

impl BallotValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_candidate(
        &mut self,
        category: Category,
        candidate_id: CandidateId,
        selected: bool,
    ) -> bool {
        if self.abstentions[category] {
            tracing::debug!("Ignoring selection in {}: category is abstained", category);
            return false;
        }

        let current = &mut self.selections[category];
        let changed = if selected {
            if current.contains(&candidate_id) {
                false
            } else if current.len() >= category.limits().maximum {
                tracing::debug!(
                    "Ignoring candidate {} in {}: maximum of {} reached",
                    candidate_id,
                    category,
                    category.limits().maximum
                );
                false
            } else {
                current.push(candidate_id);
                true
            }
        } else {
            let before = current.len();
            current.retain(|id| *id != candidate_id);
            current.len() != before
        };

        if changed {
            self.touched[category] = true;
        }
        changed
    }

    pub fn set_abstention(&mut self, category: Category, abstain: bool) {
        self.abstentions[category] = abstain;
        self.touched[category] = true;
        if abstain {
            self.selections[category].clear();
        }
    }

    pub fn is_category_valid(&self, category: Category) -> bool {
        self.abstentions[category] || category.limits().admits(self.selections[category].len())
    }

    pub fn all_valid(&self) -> bool {
        Category::ALL.into_iter().all(|c| self.is_category_valid(c))
    }

    pub fn invalid_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| !self.is_category_valid(*c))
            .collect()
    }

    pub fn all_abstained(&self) -> bool {
        Category::ALL.into_iter().all(|c| self.abstentions[c])
    }

    pub fn is_abstained(&self, category: Category) -> bool {
        self.abstentions[category]
    }

    pub fn selected(&self, category: Category) -> &[CandidateId] {
        &self.selections[category]
    }

    pub fn state(&self, category: Category) -> CategoryState {
        if self.abstentions[category] {
            CategoryState::Abstained
        } else if self.touched[category] || !self.selections[category].is_empty() {
            CategoryState::Selecting(self.selections[category].len())
        } else {
            CategoryState::Unset
        }
    }

    pub fn selections(&self) -> &PerCategory<Vec<CandidateId>> {
        &self.selections
    }

    pub fn abstentions(&self) -> &PerCategory<bool> {
        &self.abstentions
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn build_ballot(&self, voter_id: MemberId) -> Ballot {
        build_ballot(voter_id, &self.selections, &self.abstentions)
    }
}

/// Shapes the current state into a ballot, in canonical category order.
/// Callers check validity first.
pub fn build_ballot(
    voter_id: MemberId,
    selections: &PerCategory<Vec<CandidateId>>,
    abstentions: &PerCategory<bool>,
) -> Ballot {
    let votes = Category::ALL
        .into_iter()
        .map(|category| CategoryVote {
            category,
            choice: if abstentions[category] {
                CategoryChoice::Abstained
            } else {
                CategoryChoice::Selected(selections[category].clone())
            },
        })
        .collect();

    Ballot { voter_id, votes }
}
