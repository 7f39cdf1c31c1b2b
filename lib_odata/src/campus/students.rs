//! Student extraction queries.
//!
//! These are the read sides of the health-services and bookstore
//! integrations: recently changed student records with their enrollment
//! expansions, current related addresses, hold-group membership, and the
//! full active-student roster.

use std::collections::HashSet;

use chrono::{Duration, Local};
use serde_json::Value;

use super::{extract_value_list, filters, CampusApi};
use crate::retrieve::odata_http::ODataError;

/// Days of history pulled when looking for recently changed records. The
/// buffer gives a failed run time to be noticed before any back-processing
/// is needed to fill skipped records.
pub const UPDATE_WINDOW_DAYS: i64 = 10;

impl CampusApi {
    /// All students whose student or enrollment record changed within the
    /// update window, with the enrollment expansions the downstream
    /// integrations consume.
    ///
    /// Archive students are filtered out, as are "Transfer To Other
    /// Program" enrollments (a subsequent enrollment always exists for
    /// those).
    pub async fn recently_modified_students(
        &self,
        update_window_days: Option<i64>,
    ) -> Result<Option<Vec<Value>>, ODataError> {
        let window_days = update_window_days.unwrap_or(UPDATE_WINDOW_DAYS);
        let today = Local::now().date_naive();
        let update_window = today - Duration::days(window_days);
        let enrollment_filter = format!(
            "e/LastModifiedDateTime gt {update_window} and e/ExpectedStartDate lt {today}"
        );

        self.client
            .logger()
            .info(
                &format!("Getting students modified in the last {window_days} days..."),
                None,
            )
            .await;

        let url = format!(
            "{base}ds/odata/Students\
             ?$filter=SchoolStatus/Code ne 'ARCAUST' and SchoolStatus/Code ne 'ARCHIVE' \
             and (LastModifiedDateTime gt {update_window} or EnrollmentPeriods/any(e: {enrollment_filter}))\
             &$select=Id,FirstName,LastName,MiddleName,StudentNumber,MaritalStatus,NiStudent,\
             EmailAddress,Ssn,OriginalExpectedStartDate,MobilePhoneNumber,NickName,Suffix,\
             DateOfBirth,Gender,Veteran,StreetAddress,City,State,PostalCode,PhoneNumber,OtherPhoneNumber\
             &$expand=EnrollmentPeriods(\
             $filter=SchoolStatus/Code ne 'TOPROG';\
             $select=Id,CreditHoursScheduled,ProgramVersionName,ClockHoursScheduled,Gpa,\
             ExpectedStartDate,ActualStartDate,GraduationDate,SchoolStatusChangeDate,CreatedDateTime;\
             $expand=StartTerm($select=Code), GradeLevel($select=Name), ProgramVersion($select=Code),\
             SchoolStatus($expand=SystemSchoolStatus($select=SystemStatusCategory); $select=SystemSchoolStatus),\
             Shift($select=Code)),\
             Gender($select=Name),\
             Country($select=Name),\
             StudentEthnicities($select=Ethnicity; $expand=Ethnicity($select=Name)),\
             MaritalStatus($select=Name),\
             SchoolStatus($expand=SystemSchoolStatus($select=Id,SystemStatusCategory); $select=Code,Name)",
            base = self.integration_uri,
        );

        let response = self.client.get_paged(&url, Some(200), None).await?;
        Ok(extract_value_list(response))
    }

    /// The current related addresses for students changed within the update
    /// window.
    pub async fn current_related_addresses(
        &self,
        update_window_days: Option<i64>,
    ) -> Result<Option<Vec<Value>>, ODataError> {
        let window_days = update_window_days.unwrap_or(UPDATE_WINDOW_DAYS);
        let today = Local::now().date_naive();
        let update_window = today - Duration::days(window_days);
        let enrollment_filter = format!(
            "e/LastModifiedDateTime gt {update_window} and e/ExpectedStartDate lt {today}"
        );

        self.client
            .logger()
            .info("Getting current addresses for active students from CNS...", None)
            .await;

        let url = format!(
            "{base}ds/odata/StudentRelationshipAddresses\
             ?$filter=(AddressEndDate eq null or AddressEndDate gt {today}) \
             and (Student/LastModifiedDateTime gt {update_window} or Student/EnrollmentPeriods/any(e: {enrollment_filter}))\
             &$select=StudentId,AddressBeginDate,FirstName,LastName,RelationToStudent,StreetAddress,\
             City,State,PostalCode,PhoneNumber,OtherPhone,EmailAddress,LastModifiedDateTime\
             &$expand=AddressType($select=Code,Name)",
            base = self.integration_uri,
        );

        let response = self.client.get_paged(&url, Some(500), None).await?;
        Ok(extract_value_list(response))
    }

    /// Ids of students who are currently members of a hold group.
    pub async fn students_with_holds(
        &self,
        update_window_days: Option<i64>,
    ) -> Result<Option<HashSet<i64>>, ODataError> {
        let window_days = update_window_days.unwrap_or(UPDATE_WINDOW_DAYS);
        let today = Local::now().date_naive();
        let update_window = today - Duration::days(window_days);
        let enrollment_filter = format!(
            "e/LastModifiedDateTime gt {update_window} and e/ExpectedStartDate lt {today}"
        );

        self.client
            .logger()
            .info("Getting student hold groups...", None)
            .await;

        let url = format!(
            "{base}ds/campusnexus/StudentGroupMembers\
             ?$select=Id, StudentId\
             &$filter=IsActive eq true and StudentGroup/HoldCodes/any() \
             and (Student/LastModifiedDateTime gt {update_window} or Student/EnrollmentPeriods/any(e: {enrollment_filter}))",
            base = self.integration_uri,
        );

        let response = self.client.get_paged(&url, Some(1000), None).await?;
        Ok(extract_value_list(response).map(|members| {
            members
                .iter()
                .filter_map(|member| member.get("StudentId").and_then(Value::as_i64))
                .collect()
        }))
    }

    /// All currently active or admitted students with their most recent
    /// active-or-attending enrollment expanded.
    pub async fn active_students(&self) -> Result<Option<Vec<Value>>, ODataError> {
        let active_status_filter = filters::active_and_admitted_category_filter(
            "SchoolStatus/SystemSchoolStatus/SystemStatusCategory",
        );

        self.client
            .logger()
            .info("Getting all active students from CNS...", None)
            .await;

        let url = format!(
            "{base}ds/odata/Students\
             ?$filter={active_status_filter}\
             &$select=Id,StudentNumber,FirstName,LastName,EmailAddress,StreetAddress,City,State,PostalCode\
             &$expand=Title($select=Name), Country($select=Code), VeteranDetails($select=VeteranAffairsCertificationTypeId),\
             EnrollmentPeriods($filter={active_status_filter}; $orderby=ExpectedStartDate desc; $select=Id, SchoolStatus;\
             $expand=ProgramVersion($select=Code),\
             SchoolStatus($select=SystemSchoolStatus;\
             $expand=SystemSchoolStatus($select=SystemStatusCategory)))",
            base = self.integration_uri,
        );

        let response = self.client.get_paged(&url, Some(200), None).await?;
        Ok(extract_value_list(response))
    }
}
