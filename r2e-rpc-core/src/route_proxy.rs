use crate::error::{ConfigurationError, HttpError};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::registry::RouteDef;
use crate::schema::{serialize_request, CollectionMeta, CollectionParser, RequestSchema};
use crate::serializer::SerializerRegistry;
use crate::transport::{CallContext, Transport};
use crate::types::{HttpMethod, HttpRequest, HttpResponse, HttpTimeout};
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Identifies which call produced a [`ResponseBox`]: `(method, path,
/// resource, client)`, as spec.md §3 requires.
#[derive(Debug, Clone)]
pub struct CallTag {
    pub method: HttpMethod,
    pub path: String,
    pub resource: String,
    pub client_name: String,
}

/// The algebraic envelope returned by item routes: `Ok(HttpResponse)` or
/// `Err(HttpError)`, tagged with the call site. Schema parsing is lazy — it
/// only happens when one of the combinators below is invoked.
pub struct ResponseBox<Resp, Err = HttpError> {
    raw: Result<HttpResponse, HttpError>,
    request: HttpRequest,
    tag: CallTag,
    error_parser: Arc<dyn Fn(HttpError) -> Err + Send + Sync>,
    _marker: PhantomData<Resp>,
}

impl<Resp, Err> ResponseBox<Resp, Err>
where
    Resp: DeserializeOwned,
{
    pub fn new(
        request: HttpRequest,
        raw: Result<HttpResponse, HttpError>,
        tag: CallTag,
        error_parser: Arc<dyn Fn(HttpError) -> Err + Send + Sync>,
    ) -> Self {
        Self {
            raw,
            request,
            tag,
            error_parser,
            _marker: PhantomData,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.raw.is_ok()
    }

    pub fn is_err(&self) -> bool {
        self.raw.is_err()
    }

    pub fn tag(&self) -> &CallTag {
        &self.tag
    }

    /// Raw JSON payload regardless of ok/err.
    pub fn json(&self) -> serde_json::Value {
        match &self.raw {
            Ok(resp) => resp.json.clone(),
            Err(HttpError::Status { response, .. }) => response.json.clone(),
            Err(_) => serde_json::Value::Null,
        }
    }

    fn into_typed(self) -> Result<Resp, Err> {
        match self.raw {
            Ok(resp) => serde_json::from_value(resp.json.clone()).map_err(|_| {
                // The response reached the caller but its body did not match
                // the declared response schema; folded into Status since it
                // carries the same (request, response, status) triple.
                (self.error_parser)(HttpError::Status {
                    status_code: resp.status,
                    request: self.request.clone(),
                    response: resp,
                })
            }),
            Err(e) => Err((self.error_parser)(e)),
        }
    }

    pub fn into_result(self) -> Result<Resp, Err> {
        self.into_typed()
    }

    pub fn unwrap(self) -> Resp
    where
        Err: fmt::Debug,
    {
        self.into_typed().unwrap()
    }

    pub fn unwrap_err(self) -> Err
    where
        Resp: fmt::Debug,
    {
        self.into_typed().unwrap_err()
    }

    pub fn unwrap_or(self, default: Resp) -> Resp {
        self.into_typed().unwrap_or(default)
    }

    pub fn unwrap_or_else(self, f: impl FnOnce(Err) -> Resp) -> Resp {
        self.into_typed().unwrap_or_else(f)
    }

    pub fn expect(self, msg: &str) -> Resp
    where
        Err: fmt::Debug,
    {
        self.into_typed().expect(msg)
    }

    pub fn expect_err(self, msg: &str) -> Err
    where
        Resp: fmt::Debug,
    {
        self.into_typed().expect_err(msg)
    }

    pub fn map<U>(self, f: impl FnOnce(Resp) -> U) -> Result<U, Err> {
        self.into_typed().map(f)
    }

    pub fn map_or<U>(self, default: U, f: impl FnOnce(Resp) -> U) -> U {
        self.into_typed().map_or(default, f)
    }

    pub fn map_or_else<U>(self, default: impl FnOnce(Err) -> U, f: impl FnOnce(Resp) -> U) -> U {
        self.into_typed().map_or_else(default, f)
    }

    pub fn map_err<F>(self, f: impl FnOnce(Err) -> F) -> Result<Resp, F> {
        self.into_typed().map_err(f)
    }

    pub fn and_then<U>(self, f: impl FnOnce(Resp) -> Result<U, Err>) -> Result<U, Err> {
        self.into_typed().and_then(f)
    }

    pub fn or_else<F>(self, f: impl FnOnce(Err) -> Result<Resp, F>) -> Result<Resp, F> {
        self.into_typed().or_else(f)
    }
}

/// Error surfaced by collection routes. Preparation failures and transport
/// failures share one channel since, unlike item routes, a collection-GET
/// "raises rather than boxes" its failures (spec.md §4.3) — there is no
/// iterator to return on error.
#[derive(Debug)]
pub enum CollectionError {
    Configuration(ConfigurationError),
    Http(HttpError),
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::Configuration(e) => write!(f, "{e}"),
            CollectionError::Http(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CollectionError {}

impl From<ConfigurationError> for CollectionError {
    fn from(e: ConfigurationError) -> Self {
        CollectionError::Configuration(e)
    }
}

impl From<HttpError> for CollectionError {
    fn from(e: HttpError) -> Self {
        CollectionError::Http(e)
    }
}

/// Lazily parses one collection item per `next()` call; `meta` (count,
/// optional total_count, links) is available before iteration starts.
pub struct CollectionIterator<Item> {
    pub meta: CollectionMeta,
    items: std::vec::IntoIter<serde_json::Value>,
    _marker: PhantomData<Item>,
}

impl<Item> CollectionIterator<Item> {
    pub fn new(meta: CollectionMeta, items: Vec<serde_json::Value>) -> Self {
        Self {
            meta,
            items: items.into_iter(),
            _marker: PhantomData,
        }
    }
}

impl<Item: DeserializeOwned> Iterator for CollectionIterator<Item> {
    type Item = Result<Item, serde_json::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(serde_json::from_value)
    }
}

/// Per-resource handle returned by `Client::resource(name)`. Dispatches verb
/// calls and builds HTTP requests against one resource of one client.
pub struct RouteProxy {
    pub(crate) client_name: String,
    pub(crate) resource: String,
    pub(crate) endpoint: String,
    pub(crate) route: RouteDef,
    pub(crate) chain: MiddlewareChain,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) serializers: Arc<SerializerRegistry>,
    pub(crate) default_timeout: HttpTimeout,
    pub(crate) client_auth: Option<Arc<dyn Middleware>>,
    pub(crate) factory_auth: Arc<dyn Middleware>,
    pub(crate) collection_parser: Arc<dyn CollectionParser>,
    pub(crate) error_parser: Arc<dyn Fn(HttpError) -> HttpError + Send + Sync>,
}

impl RouteProxy {
    fn effective_auth(&self, call_auth: Option<Arc<dyn Middleware>>) -> Arc<dyn Middleware> {
        call_auth
            .or_else(|| self.client_auth.clone())
            .unwrap_or_else(|| self.factory_auth.clone())
    }

    fn effective_timeout(&self, call_timeout: Option<HttpTimeout>) -> HttpTimeout {
        call_timeout.unwrap_or(self.default_timeout)
    }

    fn url_pattern(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    async fn call_item<Req, Resp>(
        &self,
        method: HttpMethod,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        let verb = method.as_str();
        if self.route.path.is_none() {
            return Err(ConfigurationError::UnregisteredRoute {
                verb,
                resource: self.resource.clone(),
                client_name: self.client_name.clone(),
            });
        }
        if !self.route.methods.contains(&method) {
            return Err(ConfigurationError::NoContract {
                verb,
                resource: self.resource.clone(),
            });
        }
        let path = self.route.path.clone().unwrap();
        let url_pattern = self.url_pattern(&path);
        let http_req = serialize_request(&params, method, &url_pattern, None, &self.serializers)?;

        let ctx = CallContext {
            client_name: self.client_name.clone(),
            resource: self.resource.clone(),
            path_pattern: path.clone(),
            timeout: self.effective_timeout(timeout),
        };
        let mut call_chain = self.chain.clone();
        call_chain.add_middleware(self.effective_auth(auth));
        let raw = call_chain.run(http_req.clone(), &ctx, self.transport.as_ref()).await;
        let tag = CallTag {
            method,
            path,
            resource: self.resource.clone(),
            client_name: self.client_name.clone(),
        };
        Ok(ResponseBox::new(http_req, raw, tag, self.error_parser.clone()))
    }

    async fn call_collection_item<Req, Resp>(
        &self,
        method: HttpMethod,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        let verb = method.as_str();
        if self.route.collection_path.is_none() {
            return Err(ConfigurationError::UnregisteredRoute {
                verb,
                resource: self.resource.clone(),
                client_name: self.client_name.clone(),
            });
        }
        if !self.route.collection_methods.contains(&method) {
            return Err(ConfigurationError::NoContract {
                verb,
                resource: self.resource.clone(),
            });
        }
        let path = self.route.collection_path.clone().unwrap();
        let url_pattern = self.url_pattern(&path);
        let http_req = serialize_request(&params, method, &url_pattern, None, &self.serializers)?;

        let ctx = CallContext {
            client_name: self.client_name.clone(),
            resource: self.resource.clone(),
            path_pattern: path.clone(),
            timeout: self.effective_timeout(timeout),
        };
        let mut call_chain = self.chain.clone();
        call_chain.add_middleware(self.effective_auth(auth));
        let raw = call_chain.run(http_req.clone(), &ctx, self.transport.as_ref()).await;
        let tag = CallTag {
            method,
            path,
            resource: self.resource.clone(),
            client_name: self.client_name.clone(),
        };
        Ok(ResponseBox::new(http_req, raw, tag, self.error_parser.clone()))
    }

    pub async fn head<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_item(HttpMethod::Head, params, auth, timeout).await
    }

    pub async fn get<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_item(HttpMethod::Get, params, auth, timeout).await
    }

    pub async fn post<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_item(HttpMethod::Post, params, auth, timeout).await
    }

    pub async fn put<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_item(HttpMethod::Put, params, auth, timeout).await
    }

    pub async fn patch<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_item(HttpMethod::Patch, params, auth, timeout).await
    }

    pub async fn delete<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_item(HttpMethod::Delete, params, auth, timeout).await
    }

    pub async fn options<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_item(HttpMethod::Options, params, auth, timeout).await
    }

    pub async fn collection_head<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_collection_item(HttpMethod::Head, params, auth, timeout).await
    }

    pub async fn collection_post<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_collection_item(HttpMethod::Post, params, auth, timeout).await
    }

    pub async fn collection_put<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_collection_item(HttpMethod::Put, params, auth, timeout).await
    }

    pub async fn collection_patch<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_collection_item(HttpMethod::Patch, params, auth, timeout).await
    }

    pub async fn collection_delete<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_collection_item(HttpMethod::Delete, params, auth, timeout).await
    }

    pub async fn collection_options<Req, Resp>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<ResponseBox<Resp>, ConfigurationError>
    where
        Req: RequestSchema,
        Resp: DeserializeOwned,
    {
        self.call_collection_item(HttpMethod::Options, params, auth, timeout).await
    }

    /// GET on the collection route. Returns a [`CollectionIterator`] with
    /// `meta` available up front; unlike every other verb method this one
    /// raises on failure instead of boxing it, since an iterator has no
    /// natural `Err` slot (spec.md §4.3).
    pub async fn collection_get<Req, Item>(
        &self,
        params: Req,
        auth: Option<Arc<dyn Middleware>>,
        timeout: Option<HttpTimeout>,
    ) -> Result<CollectionIterator<Item>, CollectionError>
    where
        Req: RequestSchema,
        Item: DeserializeOwned,
    {
        let method = HttpMethod::Get;
        let verb = method.as_str();
        if self.route.collection_path.is_none() {
            return Err(ConfigurationError::UnregisteredRoute {
                verb,
                resource: self.resource.clone(),
                client_name: self.client_name.clone(),
            }
            .into());
        }
        if !self.route.collection_methods.contains(&method) {
            return Err(ConfigurationError::NoContract {
                verb,
                resource: self.resource.clone(),
            }
            .into());
        }
        let path = self.route.collection_path.clone().unwrap();
        let url_pattern = self.url_pattern(&path);
        let http_req = serialize_request(&params, method, &url_pattern, None, &self.serializers)?;

        let ctx = CallContext {
            client_name: self.client_name.clone(),
            resource: self.resource.clone(),
            path_pattern: path,
            timeout: self.effective_timeout(timeout),
        };
        let mut call_chain = self.chain.clone();
        call_chain.add_middleware(self.effective_auth(auth));
        let response = call_chain.run(http_req, &ctx, self.transport.as_ref()).await?;
        let (meta, items) = self.collection_parser.parse(&response);
        Ok(CollectionIterator::new(meta, items))
    }
}
