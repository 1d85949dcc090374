use std::sync::{PoisonError, RwLock};

use futures::future::{BoxFuture, FutureExt};

use crate::availability::dense;
use crate::catalog::Catalog;
use crate::clinic::{ClinicId, RawClinic, VaccinePayload};
use crate::errors::BackendError;
use crate::repository::{fixture, Repository, Upsert};

/// A repository held entirely in memory.
pub struct MemoryRepository {
    clinics: RwLock<Vec<RawClinic>>,
    catalog: Catalog,
}

impl MemoryRepository {
    pub fn new(clinics: Vec<RawClinic>, catalog: Catalog) -> Self {
        MemoryRepository {
            clinics: RwLock::new(clinics),
            catalog,
        }
    }

    /// Creates a repository seeded with the demonstration clinics.
    pub fn with_fixture(catalog: Catalog) -> Self {
        MemoryRepository::new(fixture::clinics().to_vec(), catalog)
    }
}

impl Repository for MemoryRepository {
    fn fetch_all(&self) -> BoxFuture<Result<Vec<RawClinic>, BackendError>> {
        async move {
            let clinics = self
                .clinics
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();

            Ok(clinics)
        }
        .boxed()
    }

    fn fetch_distinct_cities(&self) -> BoxFuture<Result<Vec<String>, BackendError>> {
        async move {
            let mut cities: Vec<String> = self
                .clinics
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|c| c.city.clone())
                .filter(|city| !city.is_empty())
                .collect();

            cities.sort();
            cities.dedup();

            Ok(cities)
        }
        .boxed()
    }

    fn set_availability(
        &self,
        clinic_id: ClinicId,
        vaccine: &str,
        available: bool,
    ) -> BoxFuture<Result<Upsert, BackendError>> {
        let vaccine = vaccine.to_owned();

        async move {
            let mut clinics = self.clinics.write().unwrap_or_else(PoisonError::into_inner);

            let clinic = match clinics.iter_mut().find(|c| c.id == clinic_id) {
                Some(clinic) => clinic,
                None => return Ok(Upsert::MissingClinic),
            };

            if !self.catalog.contains(&vaccine) {
                return Ok(Upsert::MissingVaccine);
            }

            let mut availability = dense(clinic.vaccines.as_ref(), &self.catalog);
            availability.set(&vaccine, available);
            clinic.vaccines = Some(VaccinePayload::Flags(availability.to_flags()));

            Ok(Upsert::Applied)
        }
        .boxed()
    }
}
