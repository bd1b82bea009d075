pub mod ballot;
pub mod ranking;
pub mod session;

pub use crate::domain::model::{
    AssemblyMember, Ballot, Candidate, CandidateId, Category, CategoryChoice, CategoryLimits,
    CategoryVote, MemberId, PerCategory, RankingRecord,
};
pub use crate::domain::ports::{ConfigProvider, VotingApi};
pub use crate::utils::error::Result;
