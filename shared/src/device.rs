/// Device id taken from the `X-Device-Id` header, used when the request
/// body does not carry one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceHeader(pub Option<String>);

pub const DEVICE_ID_HEADER: &str = "X-Device-Id";

impl DeviceHeader {
    /// Picks the body value when non-empty, falling back to the header.
    pub fn resolve<'a>(&'a self, body_value: &'a str) -> &'a str {
        if !body_value.is_empty() {
            return body_value;
        }
        self.0.as_deref().unwrap_or(body_value)
    }
}

#[cfg(feature = "backend")]
mod backend_impl {
    use super::*;
    use rocket::request::{FromRequest, Outcome};
    use rocket::Request;

    #[rocket::async_trait]
    impl<'r> FromRequest<'r> for DeviceHeader {
        type Error = ();

        async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
            let device_id = req
                .headers()
                .get_one(DEVICE_ID_HEADER)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            Outcome::Success(DeviceHeader(device_id))
        }
    }
}
