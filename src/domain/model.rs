use crate::utils::error::VotingError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

pub type CandidateId = u64;
pub type MemberId = u64;

/// The four groupings of the assembly. Order of `ALL` is the canonical ballot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Docentes Principales")]
    SeniorFaculty,
    #[serde(rename = "Docentes Asociados")]
    AssociateFaculty,
    #[serde(rename = "Docentes Auxiliares")]
    AssistantFaculty,
    #[serde(rename = "Estudiantes")]
    Students,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::SeniorFaculty,
        Category::AssociateFaculty,
        Category::AssistantFaculty,
        Category::Students,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::SeniorFaculty => "Docentes Principales",
            Category::AssociateFaculty => "Docentes Asociados",
            Category::AssistantFaculty => "Docentes Auxiliares",
            Category::Students => "Estudiantes",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Category::SeniorFaculty => "principales",
            Category::AssociateFaculty => "asociados",
            Category::AssistantFaculty => "auxiliares",
            Category::Students => "estudiantes",
        }
    }

    pub fn limits(self) -> CategoryLimits {
        match self {
            Category::SeniorFaculty => CategoryLimits::new(1, 3),
            Category::AssociateFaculty => CategoryLimits::new(1, 2),
            Category::AssistantFaculty => CategoryLimits::new(1, 1),
            Category::Students => CategoryLimits::new(1, 3),
        }
    }

    fn index(self) -> usize {
        match self {
            Category::SeniorFaculty => 0,
            Category::AssociateFaculty => 1,
            Category::AssistantFaculty => 2,
            Category::Students => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = VotingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted) || c.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                VotingError::validation(format!(
                    "Unknown category '{}'. Expected one of: {}",
                    wanted,
                    Category::ALL.map(|c| c.slug()).join(", ")
                ))
            })
    }
}

/// Inclusive bounds on how many candidates may be selected in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLimits {
    pub minimum: usize,
    pub maximum: usize,
}

impl CategoryLimits {
    pub const fn new(minimum: usize, maximum: usize) -> Self {
        Self { minimum, maximum }
    }

    pub fn admits(&self, count: usize) -> bool {
        count >= self.minimum && count <= self.maximum
    }
}

/// One value per category, always all four.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerCategory<T> {
    slots: [T; 4],
}

impl<T> PerCategory<T> {
    pub fn from_fn(f: impl FnMut(Category) -> T) -> Self {
        Self {
            slots: Category::ALL.map(f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T> Index<Category> for PerCategory<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.slots[category.index()]
    }
}

impl<T> IndexMut<Category> for PerCategory<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.slots[category.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub category: Category,
    /// Faculty code, "01" through "20".
    pub faculty_code: String,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyMember {
    #[serde(alias = "idasambleista")]
    pub id: MemberId,
    #[serde(alias = "nombre")]
    pub first_name: String,
    #[serde(alias = "apellido")]
    pub last_name: String,
    #[serde(alias = "ha_votado", default)]
    pub has_voted: bool,
}

impl AssemblyMember {
    pub fn new(id: MemberId, first_name: &str, last_name: &str, has_voted: bool) -> Self {
        Self {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            has_voted,
        }
    }

    pub fn display_name(&self) -> String {
        let mut name = match (self.last_name.is_empty(), self.first_name.is_empty()) {
            (true, true) => format!("#{}", self.id),
            (true, false) => self.first_name.clone(),
            (false, true) => self.last_name.clone(),
            (false, false) => format!("{}, {}", self.last_name, self.first_name),
        };
        if self.has_voted {
            name.push_str(" (Ya votó)");
        }
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRecord {
    #[serde(rename = "categoria")]
    pub category: Category,
    #[serde(rename = "idcandidato")]
    pub candidate_id: CandidateId,
    #[serde(rename = "nombre_candidato")]
    pub candidate_name: String,
    #[serde(rename = "codigo_facultad")]
    pub faculty_code: String,
    #[serde(rename = "total_votos", deserialize_with = "deserialize_vote_total")]
    pub total_votes: u64,
}

impl From<&RankingRecord> for Candidate {
    fn from(record: &RankingRecord) -> Self {
        Candidate {
            id: record.candidate_id,
            name: record.candidate_name.clone(),
            category: record.category,
            faculty_code: record.faculty_code.clone(),
            votes: record.total_votes,
        }
    }
}

// 後端的 total_votos 是聚合結果，會以字串回傳
fn deserialize_vote_total<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Total {
        Number(u64),
        Text(String),
    }

    match Total::deserialize(deserializer)? {
        Total::Number(n) => Ok(n),
        Total::Text(text) => {
            let text = text.trim();
            if let Ok(n) = text.parse::<u64>() {
                return Ok(n);
            }
            match text.parse::<f64>() {
                Ok(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
                _ => Err(serde::de::Error::custom(format!(
                    "invalid vote total '{}'",
                    text
                ))),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryChoice {
    Abstained,
    Selected(Vec<CandidateId>),
}

impl CategoryChoice {
    pub fn is_abstained(&self) -> bool {
        matches!(self, CategoryChoice::Abstained)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVote {
    pub category: Category,
    pub choice: CategoryChoice,
}

/// A finalized ballot, serialized in the shape `/registrar-voto` expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BallotBody", try_from = "BallotBody")]
pub struct Ballot {
    pub voter_id: MemberId,
    pub votes: Vec<CategoryVote>,
}

impl Ballot {
    pub fn choice(&self, category: Category) -> Option<&CategoryChoice> {
        self.votes
            .iter()
            .find(|vote| vote.category == category)
            .map(|vote| &vote.choice)
    }
}

/// JSON body of `/registrar-voto`.
#[derive(Serialize, Deserialize)]
pub struct BallotBody {
    idasambleista: MemberId,
    votos: Vec<VoteEntry>,
}

#[derive(Serialize, Deserialize)]
pub struct VoteEntry {
    categoria: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idcandidatos: Option<Vec<CandidateId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    abstencion: Option<bool>,
}

impl From<Ballot> for BallotBody {
    fn from(ballot: Ballot) -> Self {
        let votos = ballot
            .votes
            .into_iter()
            .map(|vote| match vote.choice {
                CategoryChoice::Abstained => VoteEntry {
                    categoria: vote.category,
                    idcandidatos: None,
                    abstencion: Some(true),
                },
                CategoryChoice::Selected(ids) => VoteEntry {
                    categoria: vote.category,
                    idcandidatos: Some(ids),
                    abstencion: None,
                },
            })
            .collect();

        BallotBody {
            idasambleista: ballot.voter_id,
            votos,
        }
    }
}

impl TryFrom<BallotBody> for Ballot {
    type Error = String;

    fn try_from(body: BallotBody) -> Result<Self, Self::Error> {
        let votes = body
            .votos
            .into_iter()
            .map(|entry| {
                let ids = entry.idcandidatos.unwrap_or_default();
                match entry.abstencion {
                    Some(true) if !ids.is_empty() => Err(format!(
                        "category '{}' is both abstained and has selections",
                        entry.categoria
                    )),
                    Some(true) => Ok(CategoryVote {
                        category: entry.categoria,
                        choice: CategoryChoice::Abstained,
                    }),
                    _ => Ok(CategoryVote {
                        category: entry.categoria,
                        choice: CategoryChoice::Selected(ids),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Ballot {
            voter_id: body.idasambleista,
            votes,
        })
    }
}
