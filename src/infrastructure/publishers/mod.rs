pub mod file;
pub mod http;

use anyhow::Result;

use crate::domain::models::PublisherBox;
use crate::domain::models::PublisherName;

pub struct PublisherManager {}

impl PublisherManager {
    pub fn get(name: PublisherName) -> Result<PublisherBox> {
        match name {
            PublisherName::File => return Ok(Box::<file::FilePublisher>::default()),
            PublisherName::Http => return Ok(Box::<http::HttpPublisher>::default()),
        }
    }
}
