//! Admin-side management of employee records.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::credential::{self, Credential};
use super::identifier::{self, EmployeeNumber, InvalidIdentifier, PolicyError};
use crate::models::employee::{
    EmployeeRecord, EmployeeUpdate, EmployeeView, NewEmployee, NewEmployeeRecord,
};
use crate::photos::{self, PhotoStorage, PhotoUpload, StorageError};
use crate::store::{RecordStore, StoreError};
use crate::utils::jwt::AdminContext;
use crate::utils::validation::validate_payload;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("employee number '{0}' already exists")]
    DuplicateIdentifier(String),

    #[error("employee record {0} not found")]
    RecordNotFound(Uuid),

    #[error("no employee numbered '{0}'")]
    NumberNotFound(String),

    #[error("photo storage failed: {0}")]
    PhotoStorage(#[from] StorageError),

    #[error(transparent)]
    Store(StoreError),
}

impl DirectoryError {
    fn from_store(err: StoreError, employee_number: &EmployeeNumber) -> Self {
        match err {
            StoreError::Duplicate(_) => DirectoryError::DuplicateIdentifier(employee_number.to_string()),
            other => DirectoryError::Store(other),
        }
    }
}

impl From<PolicyError> for DirectoryError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Invalid(InvalidIdentifier::AlreadyUsed(number)) => {
                DirectoryError::DuplicateIdentifier(number)
            }
            PolicyError::Invalid(other) => DirectoryError::Validation(other.to_string()),
            PolicyError::Store(err) => DirectoryError::Store(err),
        }
    }
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        DirectoryError::Store(err)
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Newest record first.
    #[default]
    Recent,
    Name,
    EmployeeNumber,
    /// Most recent joiner first.
    DateOfJoining,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub sort: Option<SortKey>,
    pub search: Option<String>,
}

pub struct DirectoryManager {
    store: Arc<dyn RecordStore>,
    photos: Arc<dyn PhotoStorage>,
    base_url: String,
    photo_max_bytes: usize,
}

impl DirectoryManager {
    pub fn new(
        store: Arc<dyn RecordStore>,
        photos: Arc<dyn PhotoStorage>,
        base_url: impl Into<String>,
        photo_max_bytes: usize,
    ) -> Self {
        DirectoryManager {
            store,
            photos,
            base_url: base_url.into(),
            photo_max_bytes,
        }
    }

    pub fn view(&self, record: &EmployeeRecord) -> EmployeeView {
        EmployeeView::from_record(record, &self.base_url)
    }

    /// Creates a record. A supplied photo is uploaded before the record is
    /// written; if the upload fails nothing is written.
    pub async fn create(
        &self,
        ctx: &AdminContext,
        fields: NewEmployee,
        photo: Option<PhotoUpload>,
    ) -> Result<EmployeeRecord> {
        validate_payload(&fields).map_err(DirectoryError::Validation)?;
        let employee_number = identifier::validate(self.store.as_ref(), &fields.employee_number).await?;

        let photo_reference = match photo {
            Some(photo) => Some(self.store_photo(&employee_number, photo).await?),
            None => None,
        };

        let record = self
            .store
            .insert(NewEmployeeRecord {
                employee_number: employee_number.clone(),
                name: fields.name.trim().to_string(),
                role: fields.role.trim().to_string(),
                date_of_joining: fields.date_of_joining,
                blood_group: fields.blood_group,
                photo_reference,
            })
            .await
            .map_err(|err| DirectoryError::from_store(err, &employee_number))?;

        info!(
            "Admin {} created employee {} ({})",
            ctx.admin_id, record.employee_number, record.record_id
        );
        Ok(record)
    }

    /// Applies a partial update to an existing record.
    ///
    /// The employee number is fixed once issued because printed cards carry
    /// it; renumbering means deleting the record and creating a new one.
    pub async fn update(
        &self,
        ctx: &AdminContext,
        record_id: Uuid,
        fields: EmployeeUpdate,
        photo: Option<PhotoUpload>,
    ) -> Result<EmployeeRecord> {
        validate_payload(&fields).map_err(DirectoryError::Validation)?;

        let mut record = self
            .store
            .find_by_id(record_id)
            .await?
            .ok_or(DirectoryError::RecordNotFound(record_id))?;

        if let Some(candidate) = &fields.employee_number {
            let requested = EmployeeNumber::parse(candidate)
                .map_err(|err| DirectoryError::Validation(err.to_string()))?;
            if requested != record.employee_number {
                return Err(DirectoryError::Validation(format!(
                    "Employee number {} cannot be changed; delete the record and create a new one to renumber",
                    record.employee_number
                )));
            }
        }

        if let Some(name) = &fields.name {
            record.name = name.trim().to_string();
        }
        if let Some(role) = &fields.role {
            record.role = role.trim().to_string();
        }
        if let Some(date_of_joining) = fields.date_of_joining {
            record.date_of_joining = date_of_joining;
        }
        if let Some(blood_group) = fields.blood_group {
            record.blood_group = blood_group;
        }
        if let Some(photo) = photo {
            // The previous photo stays in the bucket.
            record.photo_reference = Some(self.store_photo(&record.employee_number, photo).await?);
        }

        let updated = self
            .store
            .update(&record)
            .await
            .map_err(|err| DirectoryError::from_store(err, &record.employee_number))?
            .ok_or(DirectoryError::RecordNotFound(record_id))?;

        info!("Admin {} updated employee {}", ctx.admin_id, updated.employee_number);
        Ok(updated)
    }

    /// Removes a record. Its photo, if any, is left in storage.
    pub async fn delete(&self, ctx: &AdminContext, record_id: Uuid) -> Result<()> {
        if !self.store.delete(record_id).await? {
            return Err(DirectoryError::RecordNotFound(record_id));
        }
        info!("Admin {} deleted employee record {}", ctx.admin_id, record_id);
        Ok(())
    }

    pub async fn get(&self, _ctx: &AdminContext, record_id: Uuid) -> Result<EmployeeRecord> {
        self.store
            .find_by_id(record_id)
            .await?
            .ok_or(DirectoryError::RecordNotFound(record_id))
    }

    /// Looks a record up by the number printed on its card. Matching is exact.
    pub async fn get_by_number(&self, _ctx: &AdminContext, employee_number: &str) -> Result<EmployeeRecord> {
        let number = EmployeeNumber::parse(employee_number)
            .map_err(|err| DirectoryError::Validation(err.to_string()))?;
        self.store
            .find_by_employee_number(number.as_str())
            .await?
            .ok_or_else(|| DirectoryError::NumberNotFound(number.to_string()))
    }

    /// Snapshot of the directory, filtered and ordered per `query`. Ordering
    /// happens on the returned copy only.
    pub async fn list(&self, _ctx: &AdminContext, query: &ListQuery) -> Result<Vec<EmployeeRecord>> {
        let snapshot = self.store.list_all().await?;
        let filtered = match query.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => filter_records(snapshot, term),
            _ => snapshot,
        };
        Ok(sort_records(filtered, query.sort.unwrap_or_default()))
    }

    pub async fn credential(&self, ctx: &AdminContext, record_id: Uuid) -> Result<Credential> {
        let record = self.get(ctx, record_id).await?;
        credential::credential(&record, &self.base_url)
            .map_err(|err| DirectoryError::Validation(err.to_string()))
    }

    pub async fn barcode_svg(&self, ctx: &AdminContext, record_id: Uuid) -> Result<String> {
        let record = self.get(ctx, record_id).await?;
        credential::barcode_svg(&record).map_err(|err| DirectoryError::Validation(err.to_string()))
    }

    async fn store_photo(&self, employee_number: &EmployeeNumber, photo: PhotoUpload) -> Result<String> {
        let checked = photos::check_photo(&photo.data, self.photo_max_bytes)
            .map_err(DirectoryError::Validation)?;
        let file_name = format!(
            "{}-{}.{}",
            employee_number,
            Utc::now().timestamp_millis(),
            checked.extension
        );

        self.photos
            .upload(photo.data, &file_name, checked.mime_type)
            .await
            .map_err(|err| {
                warn!("Photo upload for {} failed: {}", employee_number, err);
                DirectoryError::PhotoStorage(err)
            })
    }
}

/// Case-insensitive substring match on name, employee number and role.
pub fn filter_records(records: Vec<EmployeeRecord>, term: &str) -> Vec<EmployeeRecord> {
    let needle = term.to_lowercase();
    records
        .into_iter()
        .filter(|record| {
            record.name.to_lowercase().contains(&needle)
                || record.employee_number.as_str().to_lowercase().contains(&needle)
                || record.role.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn sort_records(mut records: Vec<EmployeeRecord>, key: SortKey) -> Vec<EmployeeRecord> {
    records.sort_by(|a, b| compare(a, b, key));
    records
}

fn compare(a: &EmployeeRecord, b: &EmployeeRecord, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Recent => b.created_at.cmp(&a.created_at),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::EmployeeNumber => Ordering::Equal,
        SortKey::DateOfJoining => b.date_of_joining.cmp(&a.date_of_joining),
    };
    primary.then_with(|| a.employee_number.cmp(&b.employee_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::employee::BloodGroup;
    use crate::photos::mocks::{MockPhotoStorage, PNG_BYTES};
    use crate::store::memory::MemoryStore;

    const BASE: &str = "https://id.example.com/v";

    fn ctx() -> AdminContext {
        AdminContext { admin_id: Uuid::new_v4() }
    }

    fn manager_with(photos: Arc<MockPhotoStorage>) -> (DirectoryManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = DirectoryManager::new(store.clone(), photos, BASE, 1024);
        (manager, store)
    }

    fn manager() -> DirectoryManager {
        manager_with(Arc::new(MockPhotoStorage::default())).0
    }

    fn asha() -> NewEmployee {
        NewEmployee {
            employee_number: "DI-3001".to_string(),
            name: "Asha Rao".to_string(),
            role: "Engineer".to_string(),
            date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            blood_group: Some(BloodGroup::OPositive),
        }
    }

    fn employee(number: &str, name: &str, role: &str, joined: (i32, u32, u32)) -> NewEmployee {
        NewEmployee {
            employee_number: number.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            date_of_joining: NaiveDate::from_ymd_opt(joined.0, joined.1, joined.2).unwrap(),
            blood_group: None,
        }
    }

    #[tokio::test]
    async fn create_stores_trimmed_fields_and_derives_link() {
        let manager = manager();
        let mut fields = asha();
        fields.employee_number = "  DI-3001 ".to_string();
        fields.name = " Asha Rao ".to_string();

        let record = manager.create(&ctx(), fields, None).await.unwrap();
        assert_eq!(record.employee_number.as_str(), "DI-3001");
        assert_eq!(record.name, "Asha Rao");

        let view = manager.view(&record);
        assert_eq!(view.verification_link, credential::encode("DI-3001", BASE));
    }

    #[tokio::test]
    async fn create_rejects_blank_fields_and_bad_numbers() {
        let manager = manager();

        let mut blank_name = asha();
        blank_name.name = "   ".to_string();
        assert!(matches!(
            manager.create(&ctx(), blank_name, None).await,
            Err(DirectoryError::Validation(_))
        ));

        let mut blank_number = asha();
        blank_number.employee_number = " ".to_string();
        assert!(matches!(
            manager.create(&ctx(), blank_number, None).await,
            Err(DirectoryError::Validation(_))
        ));

        assert!(manager.list(&ctx(), &ListQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_create_with_same_number_is_a_duplicate() {
        let manager = manager();
        manager.create(&ctx(), asha(), None).await.unwrap();

        let mut other = asha();
        other.name = "Someone Else".to_string();
        let err = manager.create(&ctx(), other, None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateIdentifier(ref n) if n == "DI-3001"));

        let all = manager.list(&ctx(), &ListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Asha Rao");
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_number_have_one_winner() {
        let manager = Arc::new(manager());

        let attempts = (0..8).map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.create(&ctx(), asha(), None).await })
        });
        let results = futures_util::future::join_all(attempts).await;

        let wins = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Ok(Err(DirectoryError::DuplicateIdentifier(_)))))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(manager.list(&ctx(), &ListQuery::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_uploads_photo_before_writing_record() {
        let photos = Arc::new(MockPhotoStorage::default());
        let (manager, _) = manager_with(photos.clone());

        let record = manager
            .create(&ctx(), asha(), Some(PhotoUpload { data: PNG_BYTES.to_vec() }))
            .await
            .unwrap();

        assert_eq!(photos.upload_count(), 1);
        let reference = record.photo_reference.unwrap();
        assert!(reference.starts_with("https://photos.test/DI-3001-"));
        assert!(reference.ends_with(".png"));
    }

    #[tokio::test]
    async fn failed_photo_upload_leaves_no_record() {
        let (manager, store) = manager_with(Arc::new(MockPhotoStorage::failing()));

        let err = manager
            .create(&ctx(), asha(), Some(PhotoUpload { data: PNG_BYTES.to_vec() }))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::PhotoStorage(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_photo_is_a_validation_failure() {
        let photos = Arc::new(MockPhotoStorage::default());
        let (manager, store) = manager_with(photos.clone());

        let err = manager
            .create(&ctx(), asha(), Some(PhotoUpload { data: b"not an image".to_vec() }))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::Validation(_)));
        assert_eq!(photos.upload_count(), 0);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn name_only_update_keeps_number_link_and_identity() {
        let manager = manager();
        let created = manager.create(&ctx(), asha(), None).await.unwrap();
        let link_before = manager.view(&created).verification_link;

        let update = EmployeeUpdate {
            name: Some("Asha R. Rao".to_string()),
            ..Default::default()
        };
        let updated = manager.update(&ctx(), created.record_id, update, None).await.unwrap();

        assert_eq!(updated.record_id, created.record_id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.employee_number, created.employee_number);
        assert_eq!(updated.name, "Asha R. Rao");
        assert_eq!(updated.role, "Engineer");
        assert_eq!(manager.view(&updated).verification_link, link_before);
    }

    #[tokio::test]
    async fn lookup_by_number_is_exact() {
        let manager = manager();
        let created = manager.create(&ctx(), asha(), None).await.unwrap();

        let found = manager.get_by_number(&ctx(), " DI-3001 ").await.unwrap();
        assert_eq!(found.record_id, created.record_id);

        let err = manager.get_by_number(&ctx(), "di-3001").await.unwrap_err();
        assert!(matches!(err, DirectoryError::NumberNotFound(ref n) if n == "di-3001"));

        let err = manager.get_by_number(&ctx(), "   ").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
    }

    #[tokio::test]
    async fn blood_group_can_be_changed_and_cleared() {
        let manager = manager();
        let created = manager.create(&ctx(), asha(), None).await.unwrap();
        assert_eq!(created.blood_group, Some(BloodGroup::OPositive));

        let untouched = manager
            .update(&ctx(), created.record_id, EmployeeUpdate::default(), None)
            .await
            .unwrap();
        assert_eq!(untouched.blood_group, Some(BloodGroup::OPositive));

        let change = EmployeeUpdate {
            blood_group: Some(Some(BloodGroup::ANegative)),
            ..Default::default()
        };
        let changed = manager.update(&ctx(), created.record_id, change, None).await.unwrap();
        assert_eq!(changed.blood_group, Some(BloodGroup::ANegative));

        let cleared: EmployeeUpdate = serde_json::from_str(r#"{"bloodGroup":null}"#).unwrap();
        let cleared = manager.update(&ctx(), created.record_id, cleared, None).await.unwrap();
        assert_eq!(cleared.blood_group, None);

        let stored = manager.get(&ctx(), created.record_id).await.unwrap();
        assert_eq!(stored.blood_group, None);
    }

    #[tokio::test]
    async fn update_refuses_to_renumber() {
        let manager = manager();
        let created = manager.create(&ctx(), asha(), None).await.unwrap();

        let same = EmployeeUpdate {
            employee_number: Some(" DI-3001 ".to_string()),
            role: Some("Lead Engineer".to_string()),
            ..Default::default()
        };
        let updated = manager.update(&ctx(), created.record_id, same, None).await.unwrap();
        assert_eq!(updated.role, "Lead Engineer");

        let renumber = EmployeeUpdate {
            employee_number: Some("DI-4001".to_string()),
            ..Default::default()
        };
        let err = manager.update(&ctx(), created.record_id, renumber, None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));

        let stored = manager.get(&ctx(), created.record_id).await.unwrap();
        assert_eq!(stored.employee_number.as_str(), "DI-3001");
    }

    #[tokio::test]
    async fn update_replaces_photo_reference() {
        let photos = Arc::new(MockPhotoStorage::default());
        let (manager, _) = manager_with(photos.clone());
        let created = manager.create(&ctx(), asha(), None).await.unwrap();
        assert!(created.photo_reference.is_none());

        let updated = manager
            .update(
                &ctx(),
                created.record_id,
                EmployeeUpdate::default(),
                Some(PhotoUpload { data: PNG_BYTES.to_vec() }),
            )
            .await
            .unwrap();
        assert!(updated.photo_reference.is_some());
        assert_eq!(photos.upload_count(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_record_fail() {
        let manager = manager();
        let missing = Uuid::new_v4();

        assert!(matches!(
            manager.update(&ctx(), missing, EmployeeUpdate::default(), None).await,
            Err(DirectoryError::RecordNotFound(id)) if id == missing
        ));
        assert!(matches!(
            manager.delete(&ctx(), missing).await,
            Err(DirectoryError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_frees_the_number() {
        let manager = manager();
        let created = manager.create(&ctx(), asha(), None).await.unwrap();
        manager.delete(&ctx(), created.record_id).await.unwrap();

        assert!(matches!(
            manager.get(&ctx(), created.record_id).await,
            Err(DirectoryError::RecordNotFound(_))
        ));
        manager.create(&ctx(), asha(), None).await.unwrap();
    }

    #[tokio::test]
    async fn list_sorts_and_filters_a_copy() {
        let manager = manager();
        manager
            .create(&ctx(), employee("DI-3003", "charu", "Designer", (2023, 5, 1)), None)
            .await
            .unwrap();
        manager
            .create(&ctx(), employee("DI-3001", "Bala", "Engineer", (2024, 2, 1)), None)
            .await
            .unwrap();
        manager
            .create(&ctx(), employee("DI-3002", "Asha", "Engineer", (2022, 9, 1)), None)
            .await
            .unwrap();

        let numbers = |records: Vec<EmployeeRecord>| {
            records
                .into_iter()
                .map(|r| r.employee_number.to_string())
                .collect::<Vec<_>>()
        };

        let by_name = ListQuery { sort: Some(SortKey::Name), search: None };
        assert_eq!(
            numbers(manager.list(&ctx(), &by_name).await.unwrap()),
            ["DI-3002", "DI-3001", "DI-3003"]
        );

        let by_number = ListQuery { sort: Some(SortKey::EmployeeNumber), search: None };
        assert_eq!(
            numbers(manager.list(&ctx(), &by_number).await.unwrap()),
            ["DI-3001", "DI-3002", "DI-3003"]
        );

        let by_joining = ListQuery { sort: Some(SortKey::DateOfJoining), search: None };
        assert_eq!(
            numbers(manager.list(&ctx(), &by_joining).await.unwrap()),
            ["DI-3001", "DI-3003", "DI-3002"]
        );

        let engineers = ListQuery { sort: Some(SortKey::Name), search: Some("ENGIN".to_string()) };
        assert_eq!(
            numbers(manager.list(&ctx(), &engineers).await.unwrap()),
            ["DI-3002", "DI-3001"]
        );
    }

    #[test]
    fn sorting_does_not_touch_the_source() {
        let now = Utc::now();
        let make = |number: &str, name: &str| EmployeeRecord {
            record_id: Uuid::new_v4(),
            employee_number: EmployeeNumber::parse(number).unwrap(),
            name: name.to_string(),
            role: "Engineer".to_string(),
            date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            blood_group: None,
            photo_reference: None,
            created_at: now,
            updated_at: now,
        };
        let source = vec![make("B-2", "Zed"), make("A-1", "Amy")];

        let sorted = sort_records(source.clone(), SortKey::Name);
        assert_eq!(sorted[0].name, "Amy");
        assert_eq!(source[0].name, "Zed");
    }

    #[tokio::test]
    async fn credential_and_barcode_follow_the_record() {
        let manager = manager();
        let created = manager.create(&ctx(), asha(), None).await.unwrap();

        let card = manager.credential(&ctx(), created.record_id).await.unwrap();
        assert_eq!(card.token, "DI-3001");
        assert_eq!(card.verification_link, "https://id.example.com/v/DI-3001");

        let svg = manager.barcode_svg(&ctx(), created.record_id).await.unwrap();
        assert!(svg.contains(">DI-3001</text>"));
    }
}
