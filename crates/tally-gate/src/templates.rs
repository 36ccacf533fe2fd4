//! Template service — the concrete gated caller context.
//!
//! `create` and `duplicate` consume a `template_creation` unit through the
//! gated executor; reads, updates, and deletes are not gated (no new
//! resource comes into existence). Input validation runs before the gate so
//! a rejected payload never consumes quota.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tally_core::errors::{TallyError, TallyResult};
use tally_core::models::gate::GateOutcome;
use tally_core::models::template::{
    HashtagTemplate, NewTemplate, TemplateFilter, TemplatePage, TemplateUpdate,
};
use tally_core::models::usage::{ResourceType, UsageStats};
use tally_core::traits::ITallyStorage;

use crate::executor::GatedExecutor;
use crate::gate::QuotaGate;

pub struct TemplateService {
    storage: Arc<dyn ITallyStorage>,
    gate: Arc<QuotaGate>,
    executor: GatedExecutor,
}

impl TemplateService {
    pub fn new(storage: Arc<dyn ITallyStorage>, gate: Arc<QuotaGate>) -> Self {
        let executor = GatedExecutor::new(Arc::clone(&gate));
        Self {
            storage,
            gate,
            executor,
        }
    }

    /// Create a template. Gated.
    pub fn create(
        &self,
        user_id: &str,
        input: NewTemplate,
    ) -> TallyResult<GateOutcome<HashtagTemplate>> {
        input.validate()?;

        let now = Utc::now().timestamp();
        let template = HashtagTemplate {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: input.name,
            description: input.description,
            hashtags: input.hashtags,
            category: input.category,
            platform: input.platform,
            created_at: now,
            updated_at: now,
        };

        let storage = Arc::clone(&self.storage);
        self.executor
            .execute(user_id, ResourceType::TemplateCreation, move || {
                storage.insert_template(&template)?;
                Ok(template)
            })
    }

    /// Copy an existing template under a new id, name suffixed " (Copy)".
    /// Gated. The source lookup precedes the reservation so a missing source
    /// cannot consume quota.
    pub fn duplicate(
        &self,
        user_id: &str,
        id: &str,
    ) -> TallyResult<GateOutcome<HashtagTemplate>> {
        let original = self.get(user_id, id)?;

        let now = Utc::now().timestamp();
        let copy = HashtagTemplate {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: format!("{} (Copy)", original.name),
            description: original.description,
            hashtags: original.hashtags,
            category: original.category,
            platform: original.platform,
            created_at: now,
            updated_at: now,
        };

        let storage = Arc::clone(&self.storage);
        self.executor
            .execute(user_id, ResourceType::TemplateCreation, move || {
                storage.insert_template(&copy)?;
                Ok(copy)
            })
    }

    /// Owner-scoped lookup; missing templates are a typed error.
    pub fn get(&self, user_id: &str, id: &str) -> TallyResult<HashtagTemplate> {
        self.storage
            .get_template(user_id, id)?
            .ok_or_else(|| TallyError::TemplateNotFound { id: id.to_string() })
    }

    /// Filtered, paginated listing, newest first.
    pub fn list(&self, user_id: &str, filter: &TemplateFilter) -> TallyResult<TemplatePage> {
        self.storage.list_templates(user_id, filter)
    }

    /// Partial update. Not gated.
    pub fn update(
        &self,
        user_id: &str,
        id: &str,
        changes: &TemplateUpdate,
    ) -> TallyResult<HashtagTemplate> {
        changes.validate()?;
        self.storage
            .update_template(user_id, id, changes, Utc::now().timestamp())?
            .ok_or_else(|| TallyError::TemplateNotFound { id: id.to_string() })
    }

    /// Delete. Not gated; the creation unit stays consumed.
    pub fn delete(&self, user_id: &str, id: &str) -> TallyResult<()> {
        if self.storage.delete_template(user_id, id)? {
            Ok(())
        } else {
            Err(TallyError::TemplateNotFound { id: id.to_string() })
        }
    }

    /// Distinct non-null categories across the user's templates.
    pub fn categories(&self, user_id: &str) -> TallyResult<Vec<String>> {
        self.storage.template_categories(user_id)
    }

    /// Template-creation usage for display. Never mutates state.
    pub fn usage_stats(&self, user_id: &str) -> TallyResult<UsageStats> {
        self.gate.get_usage(user_id, ResourceType::TemplateCreation)
    }
}
