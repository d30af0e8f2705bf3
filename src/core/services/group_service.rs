use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Description, DisplayOrder, Group, GroupId, Month, Name, UserId};
use crate::errors::TrackingError;
use crate::storage::{sort_groups, GroupRepository};

use super::ServiceResult;

/// Raw group form values.
#[derive(Debug, Clone, Default)]
pub struct GroupInput {
    pub name: String,
    pub description: String,
    pub order: i64,
}

impl GroupInput {
    fn validate(self) -> ServiceResult<(Name, Description, DisplayOrder)> {
        Ok((
            Name::new(self.name.trim())?,
            Description::new(self.description.trim())?,
            DisplayOrder::new(self.order)?,
        ))
    }
}

pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupRepository>) -> Self {
        Self { groups }
    }

    pub fn create(&self, user_id: UserId, input: GroupInput) -> ServiceResult<Group> {
        let (name, description, order) = input.validate()?;
        let group = Group::new(Uuid::new_v4(), user_id, name, description, order);
        self.groups.save_group(&group)?;
        info!("group `{}` created for user {}", group.name(), user_id);
        Ok(group)
    }

    pub fn update(&self, user_id: UserId, id: GroupId, input: GroupInput) -> ServiceResult<Group> {
        let mut group = self.owned(user_id, id)?;
        let (name, description, order) = input.validate()?;
        group.update_details(name, description, order);
        self.groups.save_group(&group)?;
        debug!("group {} updated", id);
        Ok(group)
    }

    pub fn delete(&self, user_id: UserId, id: GroupId) -> ServiceResult<()> {
        self.owned(user_id, id)?;
        self.groups.delete_group(id)?;
        info!("group {} deleted", id);
        Ok(())
    }

    pub fn get(&self, user_id: UserId, id: GroupId) -> ServiceResult<Group> {
        self.owned(user_id, id)
    }

    /// All of the user's groups, by display order then name.
    pub fn list(&self, user_id: UserId) -> ServiceResult<Vec<Group>> {
        let mut groups = self.groups.find_groups_by_user(user_id)?;
        sort_groups(&mut groups);
        Ok(groups)
    }

    pub fn list_for_month(&self, user_id: UserId, month: Month) -> ServiceResult<Vec<Group>> {
        Ok(self.groups.find_groups_by_user_and_month(user_id, month)?)
    }

    /// Loads a group, hiding groups that belong to someone else.
    pub(crate) fn owned(&self, user_id: UserId, id: GroupId) -> ServiceResult<Group> {
        let group = self.groups.find_group(id)?;
        if group.user_id() != user_id {
            return Err(TrackingError::GroupNotFound(id).into());
        }
        Ok(group)
    }
}
