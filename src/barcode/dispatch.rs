use tracing::{debug, warn};

use super::Symbology;
use super::gs1::{Gs1Ai, Gs1Parser, RegexGs1Parser};
use crate::lookup::ProductLookup;
use crate::medicine::PartialMedicineInfo;

/// Routes a decoded payload to the strategy for its symbology.
pub struct Dispatcher {
    lookup: Box<dyn ProductLookup>,
    gs1: Box<dyn Gs1Parser>,
}

impl Dispatcher {
    pub fn new(lookup: Box<dyn ProductLookup>) -> Self {
        Self {
            lookup,
            gs1: Box::new(RegexGs1Parser),
        }
    }

    pub fn with_gs1_parser(mut self, parser: Box<dyn Gs1Parser>) -> Self {
        self.gs1 = parser;
        self
    }

    pub async fn route(&self, payload: &str, symbology: &Symbology) -> PartialMedicineInfo {
        match symbology {
            Symbology::Ean13 | Symbology::Ean8 | Symbology::UpcA | Symbology::UpcE => {
                self.lookup_product(payload).await
            }
            Symbology::Code128 | Symbology::DataMatrix => self.parse_if_gs1(payload),
            Symbology::Other(name) => {
                debug!("dispatch: no strategy for symbology {}", name);
                PartialMedicineInfo::default()
            }
        }
    }

    async fn lookup_product(&self, code: &str) -> PartialMedicineInfo {
        match self.lookup.lookup(code).await {
            Ok(Some(product)) => PartialMedicineInfo {
                medicine_name: Some(product.name),
                ..Default::default()
            },
            Ok(None) => {
                debug!("lookup: no product for {}", code);
                PartialMedicineInfo::default()
            }
            Err(err) => {
                warn!("lookup: error fetching {}: {:#}", code, err);
                PartialMedicineInfo::default()
            }
        }
    }

    fn parse_if_gs1(&self, payload: &str) -> PartialMedicineInfo {
        if payload.starts_with(Gs1Ai::Gtin.code()) {
            self.gs1.parse(payload)
        } else {
            PartialMedicineInfo::default()
        }
    }
}
