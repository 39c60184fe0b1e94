// src/services/fields.rs

//! Label dispatch tables for each detail page section.
//!
//! Labels are the exact (entity-decoded) header texts shown by the portal.

use std::collections::HashSet;

use crate::models::{Auction, Authority, Lot, RelatedPerson};
use crate::services::extract::{FieldTable, text};
use crate::services::parsers::{
    parse_area, parse_bool, parse_date, parse_euros, parse_minimum_bid, parse_timestamp,
};

/// Header whose value says whether the auction is split into lots.
pub const MULTI_LOT_HEADER: &str = "Lotes";

/// Value of [`MULTI_LOT_HEADER`] for a single-lot auction.
pub const SINGLE_LOT_VALUE: &str = "Sin lotes";

/// Optional sections of a detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    General,
    Authority,
    Lots,
    Related,
    Bids,
}

const TAB_LABELS: &[(&str, Tab)] = &[
    ("Información general", Tab::General),
    ("Autoridad gestora", Tab::Authority),
    ("Bienes", Tab::Lots),
    ("Lotes", Tab::Lots),
    ("Relacionados", Tab::Related),
    ("Pujas", Tab::Bids),
];

/// Map tab labels to known tabs, warning about anything unrecognised.
pub fn parse_tabs<'a>(labels: impl IntoIterator<Item = &'a str>, record_id: &str) -> HashSet<Tab> {
    let mut tabs = HashSet::new();
    for label in labels {
        match TAB_LABELS.iter().find(|(known, _)| *known == label) {
            Some((_, tab)) => {
                tabs.insert(*tab);
            }
            None => log::warn!("Unknown tab '{}' in auction {}", label, record_id),
        }
    }
    tabs
}

/// Target of the general information table: auction fields plus the
/// money fields of the implicit single lot.
#[derive(Debug)]
pub struct GeneralSection {
    pub auction: Auction,
    pub lot: Lot,
}

pub static GENERAL_FIELDS: FieldTable<GeneralSection> = FieldTable {
    section: "general",
    fields: &[
        ("Identificador", |_, _| {}),
        ("Tipo de subasta", |v, s| s.auction.kind = text(v)),
        ("Fecha de inicio", |v, s| s.auction.start_date = parse_timestamp(v)),
        ("Fecha de conclusión", |v, s| s.auction.end_date = parse_timestamp(v)),
        ("Forma adjudicación", |v, s| s.auction.award_procedure = text(v)),
        ("Anuncio BOE", |v, s| s.auction.announcement_id = text(v)),
        ("Cantidad reclamada", |v, s| s.lot.claimed_amount = parse_euros(v)),
        ("Valor subasta", |v, s| s.lot.value = parse_euros(v)),
        ("Tasación", |v, s| s.lot.valuation = parse_euros(v)),
        ("Puja mínima", |v, s| s.lot.minimum_bid = parse_minimum_bid(v)),
        ("Tramos entre pujas", |v, s| s.lot.bid_increment = parse_euros(v)),
        ("Importe del depósito", |v, s| s.lot.deposit_amount = parse_euros(v)),
    ],
};

pub static AUTHORITY_FIELDS: FieldTable<Authority> = FieldTable {
    section: "authority",
    fields: &[
        ("Código", |v, a| a.code = text(v)),
        ("Descripción", |v, a| a.description = text(v)),
        ("Dirección", |v, a| a.address = text(v)),
        ("Teléfono", |v, a| a.phone = text(v)),
        ("Fax", |v, a| a.fax = text(v)),
        ("Correo electrónico", |v, a| a.email = text(v)),
    ],
};

pub static RELATED_PERSON_FIELDS: FieldTable<RelatedPerson> = FieldTable {
    section: "related person",
    fields: &[
        ("Nombre", |v, p| p.name = text(v)),
        ("NIF", |v, p| p.tax_id = text(v)),
        ("Dirección", |v, p| p.address = text(v)),
        ("Localidad", |v, p| p.locality = text(v)),
        ("Provincia", |v, p| p.province = text(v)),
        ("País", |v, p| p.country = text(v)),
    ],
};

pub static LOT_FIELDS: FieldTable<Lot> = FieldTable {
    section: "lot",
    fields: &[
        // Money
        ("Cantidad reclamada", |v, l| l.claimed_amount = parse_euros(v)),
        ("Valor Subasta", |v, l| l.value = parse_euros(v)),
        ("Valor de tasación", |v, l| l.valuation = parse_euros(v)),
        ("Importe del depósito", |v, l| l.deposit_amount = parse_euros(v)),
        ("Puja mínima", |v, l| l.minimum_bid = parse_minimum_bid(v)),
        ("Tramos entre pujas", |v, l| l.bid_increment = parse_euros(v)),
        // Real estate
        ("Descripción", |v, l| l.description = text(v)),
        ("IDUFIR", |v, l| l.idufir = text(v)),
        ("Referencia catastral", |v, l| l.cadastral_reference = text(v)),
        ("Dirección", |v, l| l.address = text(v)),
        ("Código Postal", |v, l| l.zip_code = text(v)),
        ("Localidad", |v, l| l.locality = text(v)),
        ("Provincia", |v, l| l.province = text(v)),
        ("Superficie", |v, l| l.area = parse_area(v)),
        ("Cuota", |v, l| l.quota = parse_area(v)),
        ("Parcela", |v, l| l.parcel = text(v)),
        ("Nombre paraje", |v, l| l.place_name = text(v)),
        ("Referencia Registral", |v, l| l.registry_reference = text(v)),
        ("Vivienda habitual", |v, l| l.habitual_residence = parse_bool(v)),
        ("Situación posesoria", |v, l| l.possessory_status = text(v)),
        ("Visitable", |v, l| l.visitable = text(v)),
        ("Cargas", |v, l| l.burdens = text(v)),
        ("Inscripción registral", |v, l| l.registry_inscription = text(v)),
        ("Título jurídico", |v, l| l.legal_title = text(v)),
        ("Información adicional", |v, l| l.additional_information = text(v)),
        // Vehicles
        ("Matrícula", |v, l| l.registration_plate = text(v)),
        ("Marca", |v, l| l.brand = text(v)),
        ("Modelo", |v, l| l.model = text(v)),
        ("Número de bastidor", |v, l| l.frame_number = text(v)),
        ("Fecha de matriculación", |v, l| l.registration_date = parse_date(v)),
        ("Fecha de adquisición", |v, l| l.acquisition_date = parse_date(v)),
        ("Depósito", |v, l| l.deposit = text(v)),
    ],
};
