//! Clinics, subscriptions and the subscription ledger.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::clinic::{Clinic, LicenseKey};
use crate::domain::foundation::{ClinicId, DomainError, ErrorCode, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionEvent};
use crate::ports::{ClinicRepository, SubscriptionLedger, SubscriptionRepository};

use super::lock;

#[derive(Default)]
pub struct InMemoryClinicRepository {
    clinics: Mutex<HashMap<ClinicId, Clinic>>,
}

impl InMemoryClinicRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.clinics).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ClinicRepository for InMemoryClinicRepository {
    async fn insert(&self, clinic: &Clinic) -> Result<(), DomainError> {
        let mut clinics = lock(&self.clinics);
        if clinics.values().any(|c| c.email == clinic.email) {
            return Err(DomainError::new(
                ErrorCode::EmailAlreadyRegistered,
                "Email already registered",
            ));
        }
        if clinics.values().any(|c| c.license_key == clinic.license_key) {
            return Err(DomainError::new(
                ErrorCode::LicenseKeyConflict,
                "License key already issued",
            ));
        }
        clinics.insert(clinic.id, clinic.clone());
        Ok(())
    }

    async fn update(&self, clinic: &Clinic) -> Result<(), DomainError> {
        let mut clinics = lock(&self.clinics);
        match clinics.get_mut(&clinic.id) {
            Some(existing) => {
                *existing = clinic.clone();
                Ok(())
            }
            None => Err(DomainError::new(ErrorCode::ClinicNotFound, "Clinic not found")),
        }
    }

    async fn find_by_id(&self, id: &ClinicId) -> Result<Option<Clinic>, DomainError> {
        Ok(lock(&self.clinics).get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Clinic>, DomainError> {
        Ok(lock(&self.clinics).values().find(|c| c.email == email).cloned())
    }

    async fn find_by_license_key(&self, key: &LicenseKey) -> Result<Option<Clinic>, DomainError> {
        Ok(lock(&self.clinics)
            .values()
            .find(|c| &c.license_key == key)
            .cloned())
    }

    async fn delete(&self, id: &ClinicId) -> Result<(), DomainError> {
        lock(&self.clinics).remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    by_clinic: Mutex<HashMap<ClinicId, Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut by_clinic = lock(&self.by_clinic);
        if by_clinic.contains_key(&subscription.clinic_id) {
            return Err(DomainError::new(
                ErrorCode::SubscriptionAlreadyExists,
                "Clinic already has a subscription",
            ));
        }
        by_clinic.insert(subscription.clinic_id, subscription.clone());
        Ok(())
    }

    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut by_clinic = lock(&self.by_clinic);
        // the row id is stable across upserts
        let mut row = subscription.clone();
        if let Some(existing) = by_clinic.get(&subscription.clinic_id) {
            row.id = existing.id;
            row.created_at = existing.created_at;
        }
        by_clinic.insert(row.clinic_id, row);
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut by_clinic = lock(&self.by_clinic);
        match by_clinic.get_mut(&subscription.clinic_id) {
            Some(existing) => {
                *existing = subscription.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                "No subscription found",
            )),
        }
    }

    async fn update_if_unchanged(
        &self,
        subscription: &Subscription,
        expected_updated_at: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut by_clinic = lock(&self.by_clinic);
        match by_clinic.get_mut(&subscription.clinic_id) {
            Some(existing) if existing.updated_at == expected_updated_at => {
                *existing = subscription.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_clinic(
        &self,
        clinic_id: &ClinicId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(lock(&self.by_clinic).get(clinic_id).cloned())
    }

    async fn find_due_changes(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        Ok(lock(&self.by_clinic)
            .values()
            .filter(|s| s.is_change_due(now))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemorySubscriptionLedger {
    events: Mutex<Vec<SubscriptionEvent>>,
}

impl InMemorySubscriptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SubscriptionEvent> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl SubscriptionLedger for InMemorySubscriptionLedger {
    async fn append(&self, event: &SubscriptionEvent) -> Result<(), DomainError> {
        lock(&self.events).push(event.clone());
        Ok(())
    }

    async fn history(&self, clinic_id: &ClinicId) -> Result<Vec<SubscriptionEvent>, DomainError> {
        Ok(lock(&self.events)
            .iter()
            .filter(|e| &e.clinic_id() == clinic_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinic::NewClinic;
    use crate::domain::foundation::SubscriptionId;

    fn clinic(email: &str) -> Clinic {
        Clinic::register(
            ClinicId::new(),
            &NewClinic::from_email(email),
            LicenseKey::generate(),
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let repo = InMemoryClinicRepository::new();
        repo.insert(&clinic("ana@clinica.com")).await.unwrap();

        let err = repo.insert(&clinic("ana@clinica.com")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailAlreadyRegistered);
    }

    #[tokio::test]
    async fn rejects_duplicate_license_key() {
        let repo = InMemoryClinicRepository::new();
        let first = clinic("ana@clinica.com");
        repo.insert(&first).await.unwrap();

        let second = clinic("bia@clinica.com").with_license_key(first.license_key.clone());
        let err = repo.insert(&second).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LicenseKeyConflict);
    }

    #[tokio::test]
    async fn finds_by_license_key() {
        let repo = InMemoryClinicRepository::new();
        let c = clinic("ana@clinica.com");
        repo.insert(&c).await.unwrap();

        let found = repo.find_by_license_key(&c.license_key).await.unwrap();
        assert_eq!(found.map(|f| f.id), Some(c.id));
    }

    #[tokio::test]
    async fn upsert_keeps_row_identity() {
        let repo = InMemorySubscriptionRepository::new();
        let clinic_id = ClinicId::new();
        let now = Timestamp::now();
        let trial = Subscription::create_trial(SubscriptionId::new(), clinic_id, 14, now);
        repo.insert(&trial).await.unwrap();

        let mut replacement = trial.clone();
        replacement.id = SubscriptionId::new();
        repo.upsert(&replacement).await.unwrap();

        let stored = repo.find_by_clinic(&clinic_id).await.unwrap().unwrap();
        assert_eq!(stored.id, trial.id);
    }

    #[tokio::test]
    async fn second_insert_conflicts() {
        let repo = InMemorySubscriptionRepository::new();
        let clinic_id = ClinicId::new();
        let now = Timestamp::now();
        let trial = Subscription::create_trial(SubscriptionId::new(), clinic_id, 14, now);
        repo.insert(&trial).await.unwrap();

        let err = repo.insert(&trial).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
