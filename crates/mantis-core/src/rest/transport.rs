use super::error::Error;
use super::request::Request;
use super::response::Response;
use std::sync::Arc;

/// Sends one request and returns one response.
///
/// Every requester in this module is itself a `Transport`, so they stack:
/// a throttle gate can wrap a retry requester which wraps a logging requester
/// which wraps the network transport.
pub trait Transport {
    fn send(&self, req: &mut Request) -> Result<Response, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        (**self).send(req)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        (**self).send(req)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        (**self).send(req)
    }
}

/// Adapts a closure into a [`Transport`].
pub struct FnTransport<F>(F);

pub fn transport_fn<F>(f: F) -> FnTransport<F>
where
    F: Fn(&mut Request) -> Result<Response, Error>,
{
    FnTransport(f)
}

impl<F> Transport for FnTransport<F>
where
    F: Fn(&mut Request) -> Result<Response, Error>,
{
    fn send(&self, req: &mut Request) -> Result<Response, Error> {
        (self.0)(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testing::fake_request;
    use crate::rest::{Body, RetryRequester};
    use std::cell::Cell;
    use std::io::Read;

    #[test]
    fn closure_transport_composes_with_requesters() {
        let calls = Cell::new(0u32);
        let flaky = transport_fn(|req: &mut Request| {
            let mut body = String::new();
            req.body_mut().read_to_string(&mut body)?;
            assert_eq!(body, "hello");
            calls.set(calls.get() + 1);
            Ok(Response::new(if calls.get() < 3 { 503 } else { 200 }))
        });
        let rr = RetryRequester::new(&flaky);
        assert_eq!(rr.send(&mut fake_request("hello")).unwrap().status(), 200);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn boxed_and_shared_transports_forward() {
        let boxed: Box<dyn Transport> = Box::new(transport_fn(|_: &mut Request| Ok(Response::new(204))));
        let shared = Arc::new(boxed);
        let mut req = Request::new("GET", "http://example.com").unwrap().with_body(Body::empty());
        assert_eq!(shared.send(&mut req).unwrap().status(), 204);
    }
}
