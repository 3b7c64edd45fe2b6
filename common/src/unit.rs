//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing a document issue.
#[derive(Clone, Copy, Debug)]
pub struct Issue;

/// Marker type describing a payment deadline.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// Marker type describing the end of an offer validity.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Marker type describing a received payment.
#[derive(Clone, Copy, Debug)]
pub struct Payment;
