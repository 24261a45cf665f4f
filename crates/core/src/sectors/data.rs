//! Compiled-in national reference tables.
//!
//! Amounts are EUR. Keywords are matched against lower-cased,
//! diacritic-stripped text, so entries here are written without accents.

use crate::domain::context::{ClientProfile, Scale};
use crate::domain::estimate::TicketBand;
use crate::domain::sector::Sector;

use super::{ProjectTypeRule, SectorProfile};

// ---------------------------------------------------------------------------
// Shared detection tables
// ---------------------------------------------------------------------------

/// Ordered urgency patterns: (fragment, multiplier, reason). When several
/// match, the highest multiplier wins.
pub const URGENCY_PATTERNS: &[(&str, f64, &str)] = &[
    ("24 horas", 1.3, "entrega comprometida en 24 horas"),
    ("48 horas", 1.2, "entrega comprometida en 48 horas"),
    ("urgente", 1.15, "proyecto marcado como urgente"),
    ("cuanto antes", 1.1, "inicio inmediato solicitado"),
    ("esta semana", 1.1, "entrega dentro de la semana"),
    ("lo antes posible", 1.1, "inicio inmediato solicitado"),
];

pub const ENTERPRISE_SCALE_KEYWORDS: &[&str] =
    &["llave en mano", "integral", "turnkey", "enterprise", "corporativo", "gran escala"];

pub const SMALL_SCALE_KEYWORDS: &[&str] =
    &["piloto", "mvp", "prototipo", "prueba de concepto", "basico", "sencillo"];

pub const RAW_MATERIAL_KEYWORDS: &[&str] =
    &["acero", "madera", "cemento", "hormigon", "aluminio", "cobre", "ladrillo", "vidrio"];

/// Client-profile detection keywords, first match wins.
pub const CLIENT_PROFILE_KEYWORDS: &[(&str, ClientProfile)] = &[
    ("autonomo", ClientProfile::Freelancer),
    ("freelance", ClientProfile::Freelancer),
    ("startup", ClientProfile::Startup),
    ("agencia", ClientProfile::Agency),
    ("estudio", ClientProfile::Agency),
    ("pyme", ClientProfile::SmallBusiness),
    ("pequena empresa", ClientProfile::SmallBusiness),
    ("negocio local", ClientProfile::SmallBusiness),
    ("multinacional", ClientProfile::Enterprise),
    ("gran empresa", ClientProfile::Enterprise),
    ("corporacion", ClientProfile::Enterprise),
];

/// Positional weight table for architecture-practice distributions
/// (anteproyecto, proyecto basico, ejecucion, direccion, licencias).
pub const POSITIONAL_WEIGHTS: &[f64] = &[0.35, 0.25, 0.18, 0.12, 0.10];

/// Region → multiplier. Keys are normalized (lower-case, no accents).
const REGION_MULTIPLIERS: &[(&str, f64)] = &[
    ("madrid", 1.2),
    ("cataluna", 1.15),
    ("barcelona", 1.15),
    ("pais vasco", 1.15),
    ("baleares", 1.12),
    ("canarias", 0.95),
    ("valencia", 1.0),
    ("aragon", 0.95),
    ("galicia", 0.9),
    ("andalucia", 0.92),
    ("murcia", 0.9),
    ("extremadura", 0.85),
    ("castilla", 0.9),
];

/// Construction swings harder by province than other sectors; tried first
/// for that sector only.
const CONSTRUCTION_REGION_MULTIPLIERS: &[(&str, f64)] = &[
    ("madrid", 1.3),
    ("barcelona", 1.25),
    ("cataluna", 1.25),
    ("pais vasco", 1.2),
    ("baleares", 1.25),
    ("malaga", 1.15),
    ("canarias", 1.05),
    ("galicia", 0.92),
    ("andalucia", 0.95),
    ("extremadura", 0.85),
];

/// Generic country table, the last resort for location lookups.
const COUNTRY_MULTIPLIERS: &[(&str, f64)] = &[
    ("espana", 1.0),
    ("portugal", 0.9),
    ("francia", 1.2),
    ("alemania", 1.25),
    ("reino unido", 1.25),
    ("mexico", 0.7),
    ("argentina", 0.6),
    ("colombia", 0.65),
    ("chile", 0.8),
];

/// Resolve a normalized place name to its region key and multiplier.
/// Region-specific tables take priority over the country table;
/// construction tries its own table first.
pub fn region_multiplier(place: &str, sector: Sector) -> Option<(&'static str, f64)> {
    let lookup = |table: &'static [(&'static str, f64)]| {
        table.iter().find(|(key, _)| place.contains(key)).map(|(key, factor)| (*key, *factor))
    };

    if sector == Sector::Construction {
        if let Some(hit) = lookup(CONSTRUCTION_REGION_MULTIPLIERS) {
            return Some(hit);
        }
    }
    lookup(REGION_MULTIPLIERS).or_else(|| lookup(COUNTRY_MULTIPLIERS))
}

/// Fixed area thresholds (m²). Values between 61 and 119 read as standard.
pub fn area_scale(square_meters: f64) -> Scale {
    if square_meters >= 400.0 {
        Scale::Enterprise
    } else if square_meters >= 120.0 {
        Scale::Standard
    } else if square_meters <= 60.0 {
        Scale::Small
    } else {
        Scale::Standard
    }
}

/// Fixed breakpoints inferring scale from the upper bound of a price range.
pub fn price_range_scale(upper_bound: f64) -> Scale {
    if upper_bound >= 20_000.0 {
        Scale::Enterprise
    } else if upper_bound >= 5_000.0 {
        Scale::Standard
    } else {
        Scale::Small
    }
}

// ---------------------------------------------------------------------------
// Per-sector profiles
// ---------------------------------------------------------------------------

static SOFTWARE: SectorProfile = SectorProfile {
    sector: Sector::Software,
    keywords: &[
        "software", "aplicacion", "app movil", "pagina web", "web", "plataforma", "ecommerce",
        "tienda online", "api", "backend", "erp", "crm", "automatizacion",
    ],
    default_scale: Scale::Standard,
    bands: &[
        (Scale::Small, TicketBand::new(1_500.0, 6_000.0)),
        (Scale::Standard, TicketBand::new(6_000.0, 20_000.0)),
        (Scale::Enterprise, TicketBand::new(20_000.0, 80_000.0)),
    ],
    fallback_band: TicketBand::new(3_000.0, 18_000.0),
    concepts: &[
        "Analisis funcional y tecnico",
        "Diseno de interfaz y experiencia de usuario",
        "Desarrollo e implementacion",
        "Integraciones y migracion de datos",
        "Pruebas y control de calidad",
        "Despliegue y puesta en produccion",
    ],
    benchmarks: &[
        ("desarrollo", 7_000.0),
        ("integracion", 3_200.0),
        ("migracion", 2_600.0),
        ("diseno", 2_400.0),
        ("pruebas", 1_800.0),
        ("analisis", 1_500.0),
        ("despliegue", 1_200.0),
    ],
    weights: &[("formacion", 0.6), ("documentacion", 0.5), ("soporte", 0.8), ("seguridad", 1.2)],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.85),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.1),
        (ClientProfile::Startup, 1.05),
        (ClientProfile::Enterprise, 1.35),
    ],
    project_type_rules: &[
        ProjectTypeRule { keyword: "tienda online", tag: "ecommerce" },
        ProjectTypeRule { keyword: "ecommerce", tag: "ecommerce" },
        ProjectTypeRule { keyword: "app", tag: "app movil" },
        ProjectTypeRule { keyword: "movil", tag: "app movil" },
        ProjectTypeRule { keyword: "erp", tag: "software de gestion" },
        ProjectTypeRule { keyword: "crm", tag: "software de gestion" },
        ProjectTypeRule { keyword: "web", tag: "web" },
    ],
    project_type_tables: &[&[
        ("web", 0.9),
        ("app movil", 1.2),
        ("ecommerce", 1.1),
        ("software de gestion", 1.3),
    ]],
    volatile: false,
};

static MARKETING: SectorProfile = SectorProfile {
    sector: Sector::Marketing,
    keywords: &[
        "marketing", "publicidad", "campana", "redes sociales", "seo", "sem", "branding",
        "identidad corporativa", "contenidos", "community",
    ],
    default_scale: Scale::Standard,
    bands: &[
        (Scale::Small, TicketBand::new(500.0, 2_500.0)),
        (Scale::Standard, TicketBand::new(2_500.0, 10_000.0)),
        (Scale::Enterprise, TicketBand::new(10_000.0, 40_000.0)),
    ],
    fallback_band: TicketBand::new(1_200.0, 8_000.0),
    concepts: &[
        "Auditoria inicial y estrategia",
        "Identidad y creatividades",
        "Gestion de campanas",
        "Contenidos y redes sociales",
        "Informe de resultados",
    ],
    benchmarks: &[
        ("campana", 2_800.0),
        ("estrategia", 2_200.0),
        ("creatividad", 1_800.0),
        ("contenidos", 1_500.0),
        ("redes", 1_200.0),
        ("informe", 600.0),
    ],
    weights: &[("fotografia", 0.8), ("video", 1.3), ("auditoria", 0.7)],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.85),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.0),
        (ClientProfile::Startup, 1.1),
        (ClientProfile::Enterprise, 1.3),
    ],
    project_type_rules: &[
        ProjectTypeRule { keyword: "lanzamiento", tag: "lanzamiento" },
        ProjectTypeRule { keyword: "branding", tag: "branding" },
        ProjectTypeRule { keyword: "marca", tag: "branding" },
        ProjectTypeRule { keyword: "seo", tag: "seo" },
        ProjectTypeRule { keyword: "campana", tag: "campana" },
    ],
    project_type_tables: &[&[
        ("seo", 0.9),
        ("campana", 1.0),
        ("branding", 1.1),
        ("lanzamiento", 1.2),
    ]],
    volatile: false,
};

static CONSTRUCTION: SectorProfile = SectorProfile {
    sector: Sector::Construction,
    keywords: &[
        "obra", "reforma", "construccion", "vivienda", "edificio", "rehabilitacion", "albanileria",
        "anteproyecto", "arquitectura", "local comercial", "nave",
    ],
    default_scale: Scale::Standard,
    bands: &[
        (Scale::Small, TicketBand::new(3_000.0, 15_000.0)),
        (Scale::Standard, TicketBand::new(15_000.0, 60_000.0)),
        (Scale::Enterprise, TicketBand::new(60_000.0, 300_000.0)),
    ],
    fallback_band: TicketBand::new(8_000.0, 50_000.0),
    concepts: &[
        "Trabajos previos y replanteo",
        "Estructura y albanileria",
        "Instalaciones de fontaneria y electricidad",
        "Acabados y carpinteria",
        "Limpieza y gestion de residuos",
    ],
    benchmarks: &[
        ("estructura", 9_000.0),
        ("albanileria", 5_200.0),
        ("instalacion", 4_500.0),
        ("fontaneria", 3_000.0),
        ("electricidad", 3_200.0),
        ("acabado", 3_500.0),
        ("carpinteria", 2_800.0),
        ("demolicion", 2_000.0),
        ("limpieza", 800.0),
    ],
    weights: &[("licencia", 0.5), ("direccion", 0.9), ("residuos", 0.4)],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.9),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.05),
        (ClientProfile::Startup, 1.0),
        (ClientProfile::Enterprise, 1.25),
    ],
    project_type_rules: &[
        ProjectTypeRule { keyword: "anteproyecto", tag: "anteproyecto" },
        ProjectTypeRule { keyword: "proyecto basico", tag: "proyecto basico" },
        ProjectTypeRule { keyword: "obra nueva", tag: "obra nueva" },
        ProjectTypeRule { keyword: "rehabilitacion", tag: "rehabilitacion" },
        ProjectTypeRule { keyword: "reforma", tag: "reforma" },
        ProjectTypeRule { keyword: "licencia", tag: "licencias" },
    ],
    // Design-practice deliverables price differently from executed works;
    // the first table containing the tag applies.
    project_type_tables: &[
        &[("anteproyecto", 0.6), ("proyecto basico", 0.75), ("licencias", 0.5)],
        &[("reforma", 1.0), ("obra nueva", 1.3), ("rehabilitacion", 1.15)],
    ],
    volatile: true,
};

static EVENTS: SectorProfile = SectorProfile {
    sector: Sector::Events,
    keywords: &[
        "evento", "boda", "congreso", "feria", "concierto", "presentacion de producto",
        "catering", "celebracion", "gala",
    ],
    default_scale: Scale::Standard,
    bands: &[
        (Scale::Small, TicketBand::new(1_000.0, 5_000.0)),
        (Scale::Standard, TicketBand::new(5_000.0, 20_000.0)),
        (Scale::Enterprise, TicketBand::new(20_000.0, 100_000.0)),
    ],
    fallback_band: TicketBand::new(2_500.0, 15_000.0),
    concepts: &[
        "Conceptualizacion y diseno del evento",
        "Gestion de espacio y proveedores",
        "Produccion tecnica de sonido e iluminacion",
        "Catering y atencion a asistentes",
        "Coordinacion el dia del evento",
    ],
    benchmarks: &[
        ("catering", 4_000.0),
        ("produccion", 3_500.0),
        ("sonido", 2_200.0),
        ("iluminacion", 1_800.0),
        ("espacio", 2_500.0),
        ("coordinacion", 1_200.0),
        ("decoracion", 1_500.0),
    ],
    weights: &[("fotografia", 0.7), ("seguridad", 0.8), ("azafatas", 0.6)],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.9),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.1),
        (ClientProfile::Startup, 1.0),
        (ClientProfile::Enterprise, 1.3),
    ],
    project_type_rules: &[
        ProjectTypeRule { keyword: "boda", tag: "boda" },
        ProjectTypeRule { keyword: "congreso", tag: "congreso" },
        ProjectTypeRule { keyword: "concierto", tag: "concierto" },
        ProjectTypeRule { keyword: "feria", tag: "feria" },
    ],
    project_type_tables: &[&[
        ("boda", 1.1),
        ("congreso", 1.3),
        ("concierto", 1.2),
        ("feria", 1.15),
    ]],
    volatile: false,
};

static CONSULTING: SectorProfile = SectorProfile {
    sector: Sector::Consulting,
    keywords: &[
        "consultoria", "asesoria", "auditoria", "plan de negocio", "estrategia empresarial",
        "procesos", "transformacion digital",
    ],
    default_scale: Scale::Standard,
    bands: &[
        (Scale::Small, TicketBand::new(1_000.0, 4_000.0)),
        (Scale::Standard, TicketBand::new(4_000.0, 15_000.0)),
        (Scale::Enterprise, TicketBand::new(15_000.0, 60_000.0)),
    ],
    fallback_band: TicketBand::new(2_000.0, 12_000.0),
    concepts: &[
        "Diagnostico inicial",
        "Analisis y plan de accion",
        "Acompanamiento en la implantacion",
        "Seguimiento y cierre",
    ],
    benchmarks: &[
        ("diagnostico", 1_500.0),
        ("analisis", 2_500.0),
        ("implantacion", 3_500.0),
        ("seguimiento", 1_000.0),
    ],
    weights: &[("formacion", 0.8), ("informe", 0.6)],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.85),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.05),
        (ClientProfile::Startup, 1.05),
        (ClientProfile::Enterprise, 1.4),
    ],
    project_type_rules: &[
        ProjectTypeRule { keyword: "auditoria", tag: "auditoria" },
        ProjectTypeRule { keyword: "plan de negocio", tag: "plan de negocio" },
        ProjectTypeRule { keyword: "transformacion", tag: "transformacion" },
    ],
    project_type_tables: &[&[
        ("auditoria", 0.9),
        ("plan de negocio", 1.0),
        ("transformacion", 1.25),
    ]],
    volatile: false,
};

static COMMERCE: SectorProfile = SectorProfile {
    sector: Sector::Commerce,
    keywords: &[
        "comercio", "tienda", "retail", "punto de venta", "escaparate", "franquicia",
        "distribucion", "mayorista",
    ],
    default_scale: Scale::Standard,
    bands: &[
        (Scale::Small, TicketBand::new(800.0, 3_000.0)),
        (Scale::Standard, TicketBand::new(3_000.0, 12_000.0)),
        (Scale::Enterprise, TicketBand::new(12_000.0, 50_000.0)),
    ],
    fallback_band: TicketBand::new(1_500.0, 10_000.0),
    concepts: &[
        "Estudio de surtido y precios",
        "Implantacion de catalogo",
        "Logistica y aprovisionamiento",
        "Lanzamiento y promocion",
    ],
    benchmarks: &[
        ("catalogo", 1_800.0),
        ("logistica", 2_500.0),
        ("promocion", 1_500.0),
        ("surtido", 1_200.0),
    ],
    weights: &[("formacion", 0.6), ("escaparate", 0.8)],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.9),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.0),
        (ClientProfile::Startup, 1.0),
        (ClientProfile::Enterprise, 1.2),
    ],
    project_type_rules: &[
        ProjectTypeRule { keyword: "franquicia", tag: "franquicia" },
        ProjectTypeRule { keyword: "apertura", tag: "apertura" },
    ],
    project_type_tables: &[&[("franquicia", 1.2), ("apertura", 1.1)]],
    volatile: false,
};

static MANUFACTURING: SectorProfile = SectorProfile {
    sector: Sector::Manufacturing,
    keywords: &[
        "fabricacion", "produccion", "industrial", "mecanizado", "moldes", "prototipado",
        "serie", "taller", "soldadura",
    ],
    default_scale: Scale::Standard,
    bands: &[
        (Scale::Small, TicketBand::new(2_000.0, 10_000.0)),
        (Scale::Standard, TicketBand::new(10_000.0, 40_000.0)),
        (Scale::Enterprise, TicketBand::new(40_000.0, 200_000.0)),
    ],
    fallback_band: TicketBand::new(5_000.0, 35_000.0),
    concepts: &[
        "Ingenieria y diseno de producto",
        "Utillaje y preparacion de linea",
        "Produccion de serie",
        "Control de calidad y certificacion",
        "Embalaje y logistica",
    ],
    benchmarks: &[
        ("produccion", 8_000.0),
        ("utillaje", 4_500.0),
        ("ingenieria", 3_500.0),
        ("calidad", 2_000.0),
        ("embalaje", 1_200.0),
    ],
    weights: &[("certificacion", 0.9), ("transporte", 0.7)],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.9),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.0),
        (ClientProfile::Startup, 1.05),
        (ClientProfile::Enterprise, 1.3),
    ],
    project_type_rules: &[
        ProjectTypeRule { keyword: "prototipo", tag: "prototipado" },
        ProjectTypeRule { keyword: "serie", tag: "serie" },
        ProjectTypeRule { keyword: "molde", tag: "moldes" },
    ],
    project_type_tables: &[&[("prototipado", 0.8), ("serie", 1.2), ("moldes", 1.1)]],
    volatile: true,
};

static TRAINING: SectorProfile = SectorProfile {
    sector: Sector::Training,
    keywords: &[
        "formacion", "curso", "taller formativo", "bootcamp", "capacitacion", "mentoria",
        "clases", "certificacion profesional",
    ],
    default_scale: Scale::Standard,
    bands: &[
        (Scale::Small, TicketBand::new(500.0, 2_000.0)),
        (Scale::Standard, TicketBand::new(2_000.0, 8_000.0)),
        (Scale::Enterprise, TicketBand::new(8_000.0, 30_000.0)),
    ],
    fallback_band: TicketBand::new(1_000.0, 6_000.0),
    concepts: &[
        "Diseno del programa formativo",
        "Materiales didacticos",
        "Imparticion de sesiones",
        "Evaluacion y certificados",
    ],
    benchmarks: &[
        ("imparticion", 2_500.0),
        ("materiales", 1_200.0),
        ("diseno", 1_000.0),
        ("evaluacion", 600.0),
    ],
    weights: &[("plataforma", 0.9), ("tutoria", 0.8)],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.85),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.0),
        (ClientProfile::Startup, 1.0),
        (ClientProfile::Enterprise, 1.25),
    ],
    project_type_rules: &[
        ProjectTypeRule { keyword: "bootcamp", tag: "bootcamp" },
        ProjectTypeRule { keyword: "mentoria", tag: "mentoria" },
        ProjectTypeRule { keyword: "curso", tag: "curso" },
    ],
    project_type_tables: &[&[("curso", 1.0), ("bootcamp", 1.3), ("mentoria", 0.8)]],
    volatile: false,
};

static OTHER: SectorProfile = SectorProfile {
    sector: Sector::Other,
    keywords: &[],
    default_scale: Scale::Small,
    // No national reference band exists for generic requests; everything
    // resolves through the fallback band.
    bands: &[],
    fallback_band: TicketBand::new(1_500.0, 12_000.0),
    concepts: &[
        "Analisis de necesidades",
        "Ejecucion del servicio",
        "Revision y entrega final",
    ],
    benchmarks: &[("ejecucion", 2_000.0), ("analisis", 800.0), ("entrega", 500.0)],
    weights: &[],
    client_profile_multipliers: &[
        (ClientProfile::Freelancer, 0.9),
        (ClientProfile::SmallBusiness, 1.0),
        (ClientProfile::Agency, 1.0),
        (ClientProfile::Startup, 1.0),
        (ClientProfile::Enterprise, 1.2),
    ],
    project_type_rules: &[],
    project_type_tables: &[],
    volatile: false,
};

pub(super) fn profile(sector: Sector) -> &'static SectorProfile {
    match sector {
        Sector::Software => &SOFTWARE,
        Sector::Marketing => &MARKETING,
        Sector::Construction => &CONSTRUCTION,
        Sector::Events => &EVENTS,
        Sector::Consulting => &CONSULTING,
        Sector::Commerce => &COMMERCE,
        Sector::Manufacturing => &MANUFACTURING,
        Sector::Training => &TRAINING,
        Sector::Other => &OTHER,
    }
}

#[cfg(test)]
mod tests {
    use super::{area_scale, price_range_scale, region_multiplier, Scale, Sector};

    #[test]
    fn area_thresholds_match_reference_values() {
        assert_eq!(area_scale(500.0), Scale::Enterprise);
        assert_eq!(area_scale(400.0), Scale::Enterprise);
        assert_eq!(area_scale(150.0), Scale::Standard);
        assert_eq!(area_scale(90.0), Scale::Standard);
        assert_eq!(area_scale(45.0), Scale::Small);
    }

    #[test]
    fn price_range_breakpoints() {
        assert_eq!(price_range_scale(3_000.0), Scale::Small);
        assert_eq!(price_range_scale(9_000.0), Scale::Standard);
        assert_eq!(price_range_scale(25_000.0), Scale::Enterprise);
    }

    #[test]
    fn construction_region_table_takes_priority() {
        let generic = region_multiplier("madrid", Sector::Software);
        let construction = region_multiplier("madrid", Sector::Construction);
        assert_eq!(generic, Some(("madrid", 1.2)));
        assert_eq!(construction, Some(("madrid", 1.3)));
    }

    #[test]
    fn country_table_is_the_last_resort() {
        assert_eq!(region_multiplier("portugal", Sector::Marketing), Some(("portugal", 0.9)));
        assert_eq!(region_multiplier("atlantida", Sector::Marketing), None);
    }
}
