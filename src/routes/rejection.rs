use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

// `From<Rejection> for warp::Rejection` comes from warp's blanket
// `impl<T: Reject> From<T> for Rejection`, which calls `reject::custom`.
impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "context", rename_all = "snake_case")]
pub enum Context {
    Nearby,
    SetAvailability { clinic_id: i32, vaccine: String },
}

impl Context {
    pub fn nearby() -> Context {
        Context::Nearby
    }

    pub fn set_availability(clinic_id: i32, vaccine: String) -> Context {
        Context::SetAvailability { clinic_id, vaccine }
    }
}
