use crate::domain::model::{Candidate, Category, RankingRecord};

/// Read-only snapshot of the vote totals returned by `/ranking/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    records: Vec<RankingRecord>,
}

impl Ranking {
    pub fn new(records: Vec<RankingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RankingRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most votes first; ties fall back to faculty code, then name.
    pub fn by_category(&self, category: Category) -> Vec<&RankingRecord> {
        let mut rows: Vec<&RankingRecord> = self
            .records
            .iter()
            .filter(|r| r.category == category)
            .collect();
        rows.sort_by(|a, b| {
            b.total_votes
                .cmp(&a.total_votes)
                .then_with(|| a.faculty_code.cmp(&b.faculty_code))
                .then_with(|| a.candidate_name.cmp(&b.candidate_name))
        });
        rows
    }

    pub fn leader(&self, category: Category) -> Option<&RankingRecord> {
        self.by_category(category).into_iter().next()
    }

    pub fn total_votes(&self, category: Category) -> u64 {
        self.records
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.total_votes)
            .sum()
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        self.records.iter().map(Candidate::from).collect()
    }
}
