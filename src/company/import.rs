use tracing::{debug, instrument};

use super::models::CompanyModel;
use crate::shared::AppError;

/// Parses uploaded spreadsheet bytes into company rows.
/// Expects columns `name, code` with a header row, which is skipped.
/// Any malformed row aborts the whole import.
#[instrument(skip(data))]
pub fn parse_company_rows(data: &[u8]) -> Result<Vec<CompanyModel>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut companies = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::BadRequest(format!("Row {} could not be read: {}", index + 2, e))
        })?;

        let name = record.get(0).unwrap_or("").trim();
        let code = record.get(1).unwrap_or("").trim();

        if name.is_empty() || code.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Row {} is missing a name or code",
                index + 2
            )));
        }

        companies.push(CompanyModel::new(name.to_string(), code.to_string()));
    }

    debug!(rows = companies.len(), "Parsed company import rows");
    Ok(companies)
}
