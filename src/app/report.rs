use crate::core::ranking::Ranking;
use crate::core::{Category, RankingRecord};
use crate::utils::error::{Result, VotingError};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Renders the ranking grouped by category in canonical order.
pub fn render_ranking(
    ranking: &Ranking,
    format: ReportFormat,
    only: Option<Category>,
) -> Result<String> {
    let categories: Vec<Category> = match only {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };

    match format {
        ReportFormat::Table => Ok(render_table(ranking, &categories)),
        ReportFormat::Csv => render_csv(ranking, &categories),
        ReportFormat::Json => {
            let rows = ordered_rows(ranking, &categories);
            Ok(serde_json::to_string_pretty(&rows)?)
        }
    }
}

fn ordered_rows<'a>(ranking: &'a Ranking, categories: &[Category]) -> Vec<&'a RankingRecord> {
    categories
        .iter()
        .flat_map(|c| ranking.by_category(*c))
        .collect()
}

fn render_table(ranking: &Ranking, categories: &[Category]) -> String {
    let mut out = String::new();
    for category in categories {
        let rows = ranking.by_category(*category);
        let _ = writeln!(
            out,
            "== {} ({} votos) ==",
            category,
            ranking.total_votes(*category)
        );
        if rows.is_empty() {
            let _ = writeln!(out, "  (sin candidatos)");
        }
        for (position, row) in rows.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>2}. [{}] {:<32} {:>5}",
                position + 1,
                row.faculty_code,
                row.candidate_name,
                row.total_votes
            );
        }
    }
    out
}

fn render_csv(ranking: &Ranking, categories: &[Category]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let rows = ordered_rows(ranking, categories);
    if rows.is_empty() {
        writer.write_record([
            "categoria",
            "idcandidato",
            "nombre_candidato",
            "codigo_facultad",
            "total_votos",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer.into_inner().map_err(|e| VotingError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| VotingError::ProcessingError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}
