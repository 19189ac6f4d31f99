//! DTOs returned by the lead services.

use crate::domain::lead::Lead;

/// One page of a lead listing together with the total match count.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadsPage<T = Lead> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}
