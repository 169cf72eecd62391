///
/// FieldMap
///
/// Canonical field roles mapped to concrete storage column names. Entities
/// may rename any role (listings keep their owner under a listing-agent
/// column); the id and timestamp columns always exist.
///

#[derive(Clone, Debug)]
pub struct FieldMap {
    pub id: String,
    pub owner: String,
    pub team: String,
    pub broker: Option<String>,
    pub status: String,
    pub deleted_at: String,
    pub created_at: String,
    pub updated_at: String,
    pub version: Option<String>,
    pub is_private: Option<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            id: "id".to_owned(),
            owner: "owner_id".to_owned(),
            team: "team_id".to_owned(),
            broker: None,
            status: "status".to_owned(),
            deleted_at: "deleted_at".to_owned(),
            created_at: "created_at".to_owned(),
            updated_at: "updated_at".to_owned(),
            version: None,
            is_private: None,
        }
    }
}

impl FieldMap {
    /// All configured column names, for construction-time validation.
    pub(crate) fn columns(&self) -> Vec<&str> {
        let mut cols = vec![
            self.id.as_str(),
            self.owner.as_str(),
            self.team.as_str(),
            self.status.as_str(),
            self.deleted_at.as_str(),
            self.created_at.as_str(),
            self.updated_at.as_str(),
        ];
        if let Some(broker) = &self.broker {
            cols.push(broker);
        }
        if let Some(version) = &self.version {
            cols.push(version);
        }
        if let Some(private) = &self.is_private {
            cols.push(private);
        }
        cols
    }
}
