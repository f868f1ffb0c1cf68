//! Route table
//!
//! Holds the compiled descriptors and resolves method + path to one of them.
//! The first descriptor in declaration order that matches wins.

use hyper::Method;

use super::descriptor::{RouteDescriptor, RouteMethod};
use crate::routing::{PathParams, PathPattern};

/// A descriptor selected for a request, with the captured path parameters
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub descriptor: &'a RouteDescriptor,
    pub params: PathParams,
}

/// Outcome of a route lookup
#[derive(Debug)]
pub enum Lookup<'a> {
    Matched(RouteMatch<'a>),
    /// The path exists but not for this method. `allow` lists the declared
    /// methods for the path in declaration order, matching the routes' own
    /// `Allow` header; HEAD is answered by GET routes but not advertised.
    MethodNotAllowed { allow: String },
    NotFound,
}

struct CompiledRoute {
    descriptor: &'static RouteDescriptor,
    pattern: PathPattern,
}

pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(descriptors: &'static [RouteDescriptor]) -> Self {
        let routes = descriptors
            .iter()
            .map(|descriptor| CompiledRoute {
                descriptor,
                pattern: PathPattern::parse(descriptor.path),
            })
            .collect();
        Self { routes }
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static RouteDescriptor> + '_ {
        self.routes.iter().map(|route| route.descriptor)
    }

    pub fn find(&self, method: &Method, path: &str) -> Lookup<'_> {
        let wanted = RouteMethod::for_request(method);
        let mut allowed: Vec<RouteMethod> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };

            if Some(route.descriptor.method) == wanted {
                return Lookup::Matched(RouteMatch {
                    descriptor: route.descriptor,
                    params,
                });
            }

            if !allowed.contains(&route.descriptor.method) {
                allowed.push(route.descriptor.method);
            }
        }

        if allowed.is_empty() {
            return Lookup::NotFound;
        }

        let names: Vec<&str> = allowed.into_iter().map(RouteMethod::as_str).collect();
        Lookup::MethodNotAllowed {
            allow: names.join(", "),
        }
    }
}
