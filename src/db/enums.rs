use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled campaigns never generate leads again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        match (self, next) {
            (current, next) if *current == next => true,
            (CampaignStatus::Active, _) => true,
            (CampaignStatus::Paused, _) => true,
            _ => false,
        }
    }
}

impl FromSql<Text, Pg> for CampaignStatus {
    fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            _ => Err("Unrecognized campaign status".into()),
        }
    }
}

impl ToSql<Text, Pg> for CampaignStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Inactive => "inactive",
        }
    }
}

impl FromSql<Text, Pg> for AssignmentStatus {
    fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "active" => Ok(AssignmentStatus::Active),
            "inactive" => Ok(AssignmentStatus::Inactive),
            _ => Err("Unrecognized assignment status".into()),
        }
    }
}

impl ToSql<Text, Pg> for AssignmentStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

/// Agent-set outcome of working a lead. Any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Closed,
    NotInterested,
    Confirmed,
    NoResponse,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 5] = [
        SaleStatus::Pending,
        SaleStatus::Closed,
        SaleStatus::NotInterested,
        SaleStatus::Confirmed,
        SaleStatus::NoResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Closed => "closed",
            SaleStatus::NotInterested => "not_interested",
            SaleStatus::Confirmed => "confirmed",
            SaleStatus::NoResponse => "no_response",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql<Text, Pg> for SaleStatus {
    fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "pending" => Ok(SaleStatus::Pending),
            "closed" => Ok(SaleStatus::Closed),
            "not_interested" => Ok(SaleStatus::NotInterested),
            "confirmed" => Ok(SaleStatus::Confirmed),
            "no_response" => Ok(SaleStatus::NoResponse),
            _ => Err("Unrecognized sale status".into()),
        }
    }
}

impl ToSql<Text, Pg> for SaleStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpStatus {
    NotRequired,
    Done,
    CallDone,
    Scheduled,
}

impl FollowUpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpStatus::NotRequired => "not_required",
            FollowUpStatus::Done => "done",
            FollowUpStatus::CallDone => "call_done",
            FollowUpStatus::Scheduled => "scheduled",
        }
    }
}

impl FromSql<Text, Pg> for FollowUpStatus {
    fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "not_required" => Ok(FollowUpStatus::NotRequired),
            "done" => Ok(FollowUpStatus::Done),
            "call_done" => Ok(FollowUpStatus::CallDone),
            "scheduled" => Ok(FollowUpStatus::Scheduled),
            _ => Err("Unrecognized follow-up status".into()),
        }
    }
}

impl ToSql<Text, Pg> for FollowUpStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Agent,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Agent => "agent",
        }
    }
}

impl FromSql<Text, Pg> for UserRole {
    fn from_sql(bytes: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "admin" => Ok(UserRole::Admin),
            "agent" => Ok(UserRole::Agent),
            _ => Err("Unrecognized user role".into()),
        }
    }
}

impl ToSql<Text, Pg> for UserRole {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}
