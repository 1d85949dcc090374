use futures::future::BoxFuture;

use crate::clinic::{ClinicId, RawClinic};
use crate::errors::BackendError;

pub mod fixture;
mod memory;

pub use self::memory::MemoryRepository;
pub use self::postgres::*;

/// What an availability write found.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Upsert {
    Applied,
    MissingClinic,
    MissingVaccine,
}

/// The source of clinic records. No ordering is promised; callers sort
/// and filter after retrieval.
pub trait Repository {
    fn fetch_all(&self) -> BoxFuture<Result<Vec<RawClinic>, BackendError>>;

    /// Returns each city once, sorted.
    fn fetch_distinct_cities(&self) -> BoxFuture<Result<Vec<String>, BackendError>>;

    /// Records whether `vaccine` is available at `clinic_id`, creating
    /// the association when missing. Repeating a call changes nothing.
    fn set_availability(
        &self,
        clinic_id: ClinicId,
        vaccine: &str,
        available: bool,
    ) -> BoxFuture<Result<Upsert, BackendError>>;
}

mod postgres {
    use std::time::Duration;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgPoolOptions, PgRow},
    };

    use super::Upsert;
    use crate::clinic::{ClinicId, RawClinic, RawStatus, VaccinePayload};
    use crate::errors::BackendError;

    const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    pub struct PgRepository {
        pool: PgPool,
    }

    impl PgRepository {
        pub fn new(pool: PgPool) -> Self {
            PgRepository { pool }
        }

        /// Creates a repository whose connections are opened on first
        /// use, so an unreachable database surfaces on each request
        /// instead of at startup.
        pub fn connect_lazy(connection_string: &str) -> Result<Self, BackendError> {
            let pool = PgPoolOptions::new()
                .connect_timeout(CONNECT_TIMEOUT)
                .connect_lazy(connection_string)
                .map_err(map_sqlx_error)?;

            Ok(PgRepository::new(pool))
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Repository for PgRepository {
        fn fetch_all(&self) -> BoxFuture<Result<Vec<RawClinic>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/fetch_all.sql"));

                let clinics = query
                    .try_map(|row: PgRow| {
                        let status: Option<String> = try_get(&row, "status")?;
                        let vaccines: Option<String> = try_get(&row, "vaccines")?;

                        Ok(RawClinic {
                            id: try_get(&row, "id")?,
                            name: try_get(&row, "name")?,
                            address: try_get(&row, "address")?,
                            city: try_get(&row, "city")?,
                            latitude: try_get(&row, "latitude")?,
                            longitude: try_get(&row, "longitude")?,
                            status: status.map(RawStatus::Text),
                            opening_hours: try_get(&row, "opening_hours")?,
                            vaccines: vaccines.map(|v| VaccinePayload::from_json(&v)),
                        })
                    })
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(clinics)
            }
            .boxed()
        }

        fn fetch_distinct_cities(&self) -> BoxFuture<Result<Vec<String>, BackendError>> {
            async move {
                let query =
                    sqlx::query_as::<_, (String,)>(include_str!("queries/fetch_distinct_cities.sql"));

                let cities = query
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .into_iter()
                    .map(|(city,)| city)
                    .collect();

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
                let query = sqlx::query(include_str!("queries/set_availability.sql"));

                let count = query
                    .bind(clinic_id)
                    .bind(&vaccine)
                    .bind(available)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                if count > 0 {
                    return Ok(Upsert::Applied);
                }

                // nothing was written, so one of the two sides is missing
                let query =
                    sqlx::query_as::<_, (bool,)>(include_str!("queries/clinic_exists.sql"));

                let (clinic_exists,) = query
                    .bind(clinic_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(if clinic_exists {
                    Upsert::MissingVaccine
                } else {
                    Upsert::MissingClinic
                })
            }
            .boxed()
        }
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Io(_)
            | Error::Tls(_)
            | Error::PoolTimedOut
            | Error::PoolClosed
            | Error::WorkerCrashed => BackendError::RepositoryUnavailable { source: error },
            _ => BackendError::Sqlx { source: error },
        }
    }
}
