use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;

use super::request::parse_request;
use super::response::write_handler_response;
use crate::dispatcher::{Dispatcher, HandlerResponse};

/// `HttpService` handing every request to a shared [`Dispatcher`].
#[derive(Clone)]
pub struct AppService {
    dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let response = match parse_request(req) {
            Some(request) => self.dispatcher.dispatch(request),
            None => HandlerResponse::status_only(501),
        };
        write_handler_response(res, response);
        Ok(())
    }
}
