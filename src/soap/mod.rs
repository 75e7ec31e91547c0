//! SOAP 1.1 plumbing for the NEPLAN external web service: envelopes with a
//! WS-Security UsernameToken, reply parsing and the HTTP gateway.

pub mod envelope;
pub mod transport;
pub mod xml;

pub use envelope::{Ns, Param, SoapValue};
pub use transport::{HttpGateway, MessageExchange, MessageRecord};
pub use xml::XmlNode;
