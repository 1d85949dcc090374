//! Fetches clinic data for a request and degrades to the fixture when
//! the repository is out of reach.

use std::sync::Arc;

use log::{debug, o, warn, Logger};
use serde::Serialize;

use crate::availability::normalize;
use crate::catalog::Catalog;
use crate::clinic::{Clinic, ClinicId, RawClinic};
use crate::errors::BackendError;
use crate::repository::{fixture, Repository, Upsert};

/// Shown alongside results that came from the fallback data set.
pub const FALLBACK_NOTICE: &str =
    "Live clinic data is unavailable; showing demonstration data instead.";

/// Where the data in a response came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Fallback,
}

impl Source {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Source::Live => None,
            Source::Fallback => Some(FALLBACK_NOTICE),
        }
    }
}

/// An immutable, normalized copy of the clinics for one request.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub clinics: Vec<Clinic>,
    pub source: Source,
}

#[derive(Clone)]
pub struct Directory {
    logger: Arc<Logger>,
    repository: Arc<dyn Repository + Send + Sync>,
    catalog: Arc<Catalog>,
}

impl Directory {
    pub fn new(
        logger: Arc<Logger>,
        repository: Arc<dyn Repository + Send + Sync>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Directory {
            logger,
            repository,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fetches and normalizes every clinic. Never fails: any repository
    /// error substitutes the fixture and marks the snapshot accordingly.
    pub async fn snapshot(&self) -> Snapshot {
        match self.repository.fetch_all().await {
            Ok(rows) => Snapshot {
                clinics: self.normalize_rows(&rows),
                source: Source::Live,
            },
            Err(e) => {
                self.log_fallback("clinics", &e);

                Snapshot {
                    clinics: self.normalize_rows(fixture::clinics()),
                    source: Source::Fallback,
                }
            }
        }
    }

    /// Lists the known cities, with the same fallback as `snapshot`.
    pub async fn cities(&self) -> (Vec<String>, Source) {
        match self.repository.fetch_distinct_cities().await {
            Ok(cities) => (cities, Source::Live),
            Err(e) => {
                self.log_fallback("cities", &e);

                (fixture::cities(), Source::Fallback)
            }
        }
    }

    /// Toggles one vaccine at one clinic. Nothing falls back here: the
    /// caller learns about every failure.
    pub async fn set_availability(
        &self,
        clinic_id: ClinicId,
        vaccine: &str,
        available: bool,
    ) -> Result<(), BackendError> {
        let vaccine = self
            .catalog
            .lookup(vaccine)
            .ok_or_else(|| BackendError::UnknownVaccine(vaccine.to_owned()))?;

        let logger = self.logger.new(o!("clinic_id" => clinic_id, "vaccine" => vaccine.to_owned()));
        debug!(logger, "Setting availability..."; "available" => available);

        match self
            .repository
            .set_availability(clinic_id, vaccine, available)
            .await?
        {
            Upsert::Applied => Ok(()),
            Upsert::MissingClinic => Err(BackendError::UnknownClinic(clinic_id)),
            Upsert::MissingVaccine => {
                warn!(logger, "Catalog vaccine missing from the repository");
                Err(BackendError::UnknownVaccine(vaccine.to_owned()))
            }
        }
    }

    fn normalize_rows(&self, rows: &[RawClinic]) -> Vec<Clinic> {
        rows.iter()
            .filter(|row| match row.check() {
                Ok(()) => true,
                Err(defect) => {
                    warn!(self.logger, "Skipping clinic row"; "id" => row.id, "defect" => defect);
                    false
                }
            })
            .map(|row| {
                if let Some(payload) = row.vaccines.as_ref().filter(|p| p.is_unreadable()) {
                    warn!(self.logger, "Unreadable vaccine payload"; "id" => row.id, "payload" => ?payload);
                }

                normalize(row, &self.catalog)
            })
            .collect()
    }

    fn log_fallback(&self, what: &str, e: &BackendError) {
        if e.is_connectivity() {
            warn!(self.logger, "Repository unreachable, using fallback data"; "what" => what, "error" => %e);
        } else {
            warn!(self.logger, "Repository failed, using fallback data"; "what" => what, "error" => ?e);
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::future::{BoxFuture, FutureExt};

    use super::*;
    use crate::clinic::{RawStatus, VaccinePayload};
    use crate::repository::MemoryRepository;

    struct Unreachable;

    impl Repository for Unreachable {
        fn fetch_all(&self) -> BoxFuture<Result<Vec<RawClinic>, BackendError>> {
            async { Err(BackendError::BadRequest) }.boxed()
        }

        fn fetch_distinct_cities(&self) -> BoxFuture<Result<Vec<String>, BackendError>> {
            async { Err(BackendError::BadRequest) }.boxed()
        }

        fn set_availability(
            &self,
            _clinic_id: ClinicId,
            _vaccine: &str,
            _available: bool,
        ) -> BoxFuture<Result<Upsert, BackendError>> {
            async { Err(BackendError::BadRequest) }.boxed()
        }
    }

    fn directory(repository: Arc<dyn Repository + Send + Sync>) -> Directory {
        Directory::new(
            Arc::new(log::discard()),
            repository,
            Arc::new(Catalog::default()),
        )
    }

    #[tokio::test]
    async fn live_data_is_marked_live() {
        let catalog = Catalog::default();
        let directory = directory(Arc::new(MemoryRepository::with_fixture(catalog)));

        let snapshot = directory.snapshot().await;

        assert_eq!(snapshot.source, Source::Live);
        assert_eq!(snapshot.clinics.len(), 6);
        assert_eq!(snapshot.source.notice(), None);
    }

    #[tokio::test]
    async fn failures_fall_back_to_the_fixture() {
        let directory = directory(Arc::new(Unreachable));

        let snapshot = directory.snapshot().await;
        assert_eq!(snapshot.source, Source::Fallback);
        assert_eq!(snapshot.clinics.len(), 6);
        assert_eq!(snapshot.source.notice(), Some(FALLBACK_NOTICE));

        let (cities, source) = directory.cities().await;
        assert_eq!(source, Source::Fallback);
        assert_eq!(cities.len(), 3);
    }

    #[tokio::test]
    async fn updates_do_not_fall_back() {
        let directory = directory(Arc::new(Unreachable));

        let result = directory.set_availability(1, "Gripe", true).await;
        assert!(matches!(result, Err(BackendError::BadRequest)));
    }

    #[tokio::test]
    async fn bad_rows_are_quarantined_and_bad_payloads_defaulted() {
        let mut rows = fixture::clinics().to_vec();
        rows[0].name = String::new();
        rows[1].vaccines = Some(VaccinePayload::Unreadable {
            reason: "test".to_owned(),
        });
        rows[2].status = Some(RawStatus::Flag(false));

        let directory = directory(Arc::new(MemoryRepository::new(rows, Catalog::default())));
        let snapshot = directory.snapshot().await;

        assert_eq!(snapshot.clinics.len(), 5);
        assert_eq!(snapshot.clinics[0].id, 2);
        assert!(snapshot.clinics[0].vaccines.iter().all(|(_, a)| !a));
    }

    #[tokio::test]
    async fn unknown_vaccines_and_clinics_are_errors() {
        let directory = directory(Arc::new(MemoryRepository::with_fixture(Catalog::default())));

        assert!(matches!(
            directory.set_availability(1, "Raiva", true).await,
            Err(BackendError::UnknownVaccine(_))
        ));
        assert!(matches!(
            directory.set_availability(42, "Gripe", true).await,
            Err(BackendError::UnknownClinic(42))
        ));
        assert!(directory.set_availability(1, "Te\u{301}tano", false).await.is_ok());
    }

    #[tokio::test]
    async fn vaccines_missing_from_the_repository_are_not_blamed_on_the_clinic() {
        let repository = MemoryRepository::with_fixture(Catalog::from_list("COVID-19"));
        let directory = directory(Arc::new(repository));

        match directory.set_availability(1, "Gripe", true).await {
            Err(BackendError::UnknownVaccine(name)) => assert_eq!(name, "Gripe"),
            other => panic!("expected an unknown vaccine, got {:?}", other),
        }
    }
}
