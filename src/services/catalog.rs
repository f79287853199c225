use time::macros::format_description;
use time::{Date, Duration};

use crate::error::AppResult;
use crate::models::CatalogRow;
use crate::services::template::render_catalog_query;
use crate::session::WarehouseSession;

pub struct CatalogService;

impl CatalogService {
    /// Functions named `API_%`, in whatever order the warehouse returns them
    pub async fn list_api_functions(session: &dyn WarehouseSession) -> AppResult<Vec<CatalogRow>> {
        let result = session.execute(&render_catalog_query().to_string()).await?;

        let rows = (0..result.rows.len())
            .filter_map(|i| {
                let function_name = result.value(i, "FUNCTION_NAME")?.to_string();
                Some(CatalogRow {
                    function_name,
                    argument_signature: result
                        .value(i, "ARGUMENT_SIGNATURE")
                        .unwrap_or("()")
                        .to_string(),
                    creation_date: result.value(i, "CREATION_DATE").and_then(parse_date),
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = rows.len(), "Listed API functions");
        Ok(rows)
    }
}

/// DATE cells come back either as ISO text or, from the SQL API, as days since the epoch
pub fn parse_date(value: &str) -> Option<Date> {
    let value = value.trim();

    if let Ok(days) = value.parse::<i64>() {
        // Out-of-range day counts are treated like any other unreadable cell
        let seconds = days.checked_mul(86_400)?;
        return Date::from_calendar_date(1970, time::Month::January, 1)
            .ok()?
            .checked_add(Duration::seconds(seconds));
    }

    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::template::render_catalog_query;
    use crate::session::{InMemorySession, ResultSet};
    use time::macros::date;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2023-11-13"), Some(date!(2023 - 11 - 13)));
        assert_eq!(parse_date("19674"), Some(date!(2023 - 11 - 13)));
        assert_eq!(parse_date("0"), Some(date!(1970 - 01 - 01)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_parse_date_out_of_range() {
        assert_eq!(parse_date("999999999999999999"), None);
        assert_eq!(parse_date("-999999999999999999"), None);
        assert_eq!(parse_date("100000000"), None);
    }

    #[tokio::test]
    async fn test_list_maps_rows() {
        let session = InMemorySession::new();
        session
            .respond_to(
                "INFORMATION_SCHEMA.FUNCTIONS",
                ResultSet {
                    columns: vec![
                        "FUNCTION_NAME".to_string(),
                        "ARGUMENT_SIGNATURE".to_string(),
                        "CREATION_DATE".to_string(),
                    ],
                    rows: vec![
                        vec![
                            Some("API_GET_ID".to_string()),
                            Some("()".to_string()),
                            Some("2023-11-13".to_string()),
                        ],
                        vec![
                            Some("API_POST_ITEM".to_string()),
                            Some("(HEADERPARAM VARCHAR, BODYPARAM VARCHAR)".to_string()),
                            None,
                        ],
                    ],
                },
            )
            .await;

        let rows = CatalogService::list_api_functions(&session).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].function_name, "API_GET_ID");
        assert_eq!(rows[0].creation_date, Some(date!(2023 - 11 - 13)));
        assert_eq!(rows[1].drop_signature(), "API_POST_ITEM(VARCHAR, VARCHAR)");
        assert_eq!(rows[1].creation_date, None);

        assert_eq!(
            session.executed().await,
            vec![render_catalog_query().to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_empty_catalog() {
        let session = InMemorySession::new();
        session
            .respond_to("INFORMATION_SCHEMA.FUNCTIONS", ResultSet::default())
            .await;

        let rows = CatalogService::list_api_functions(&session).await.unwrap();
        assert!(rows.is_empty());
    }
}
