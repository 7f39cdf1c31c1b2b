//! Term and class-section queries for schedule generation.

use chrono::Local;
use serde_json::Value;

use super::{extract_value_list, CampusApi};
use crate::retrieve::odata_http::ODataError;

impl CampusApi {
    /// Child-parent relationships of all terms that have not passed and
    /// currently have classes assigned to them.
    pub async fn open_term_relationships(&self) -> Result<Option<Vec<Value>>, ODataError> {
        let today = Local::now().date_naive();

        let url = format!(
            "{base}ds/campusnexus/TermRelationships?\
             $filter=startswith(ParentTerm/Code, 'P') and ParentTerm/EndDate ge {today} and ChildTerm/ClassSections/any()\
             &$expand=ParentTerm($select=Code)",
            base = self.integration_uri,
        );

        let response = self.client.get_paged(&url, None, None).await?;
        Ok(extract_value_list(response))
    }

    /// The sections currently scheduled on the given child terms, with
    /// course, instructor, term and meeting-date expansions.
    pub async fn class_sections(
        &self,
        child_term_ids: &[i64],
    ) -> Result<Option<Vec<Value>>, ODataError> {
        self.client.logger().info("Getting Section Data...", None).await;

        let term_id_filters: Vec<String> = child_term_ids
            .iter()
            .map(|id| format!("t/TermId eq {id}"))
            .collect();

        let url = format!(
            "{base}ds/odata/ClassSections?\
             $filter=IsActive and Terms/any(t: {terms})\
             &$select=Id,CourseCode,SectionCode,MaximumStudents,NumberRegisteredStudents,\
             FinalCountRegisteredStudents,EnrollmentStatusCreditHours,DeliveryMethodId,StartDate,EndDate,Note\
             &$expand=Course($select=Name,CatalogCode),\
             Instructor($select=Name),\
             Terms($select=TermId,TermName),\
             MeetingDates($expand=Building($select=Name),\
             Room($select=RoomNumber); $select=MeetingDate, Status, StartTime, LengthMinutes)",
            base = self.integration_uri,
            terms = term_id_filters.join(" or "),
        );

        let response = self.client.get_paged(&url, Some(500), None).await?;
        Ok(extract_value_list(response))
    }

    /// Looks up class sections by Id in bounded filter batches, for lists
    /// too large to inline into a single query.
    pub async fn sections_by_ids(&self, section_ids: &[i64]) -> Option<Vec<Value>> {
        let url = format!(
            "{base}ds/odata/ClassSections?$select=Id,CourseCode,SectionCode,StartDate,EndDate",
            base = self.integration_uri,
        );
        self.client
            .get_chunked(&url, "Id eq {}", section_ids, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::loggers::loggerlocal::{LoggerLocal, LoggerLocalOptions};
    use crate::retrieve::mock_server::MockServer;
    use crate::retrieve::odata_http::ODataClient;

    fn campus_api(base: &str) -> CampusApi {
        let logger = Arc::new(LoggerLocal::new(
            "test".to_string(),
            Some(LoggerLocalOptions::default()),
        ));
        let mut client = ODataClient::new("svc_user", "secret", logger).unwrap();
        client.retries = 0;
        client.retry_sleep = Duration::from_millis(1);
        CampusApi::new(client, base)
    }

    #[tokio::test]
    async fn sections_by_ids_chunks_through_the_engine() {
        let server = MockServer::serve(vec![(
            200,
            json!({"value": [{"Id": 11}, {"Id": 12}]}).to_string(),
        )]);
        let api = campus_api(&server.url);

        let sections = api.sections_by_ids(&[11, 12]).await.unwrap();
        assert_eq!(sections.len(), 2);
        assert!(server.requests()[0].contains("$filter=Id eq 11 or Id eq 12"));
        server.join();
    }

    #[tokio::test]
    async fn open_term_relationships_unwraps_the_envelope() {
        let server = MockServer::serve(vec![(
            200,
            json!({"@odata.count": 1, "value": [{"ChildTermId": 3}]}).to_string(),
        )]);
        let api = campus_api(&server.url);

        let terms = api.open_term_relationships().await.unwrap().unwrap();
        assert_eq!(terms[0]["ChildTermId"], 3);
        server.join();
    }
}
