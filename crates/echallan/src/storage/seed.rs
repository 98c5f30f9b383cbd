//! Reference data and demo drivers seeded into empty tables.

use chrono::{Datelike, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::{params, Connection};
use tracing::info;

use crate::error::Result;
use crate::records::Driver;

/// Options controlling what gets seeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOptions {
    /// Generated drivers added after the fixed ones.
    pub random_drivers: u32,
    /// RNG seed; entropy when `None`.
    pub rng_seed: Option<u64>,
}

/// What a seeding pass inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub drivers: usize,
    pub violations: usize,
    pub districts: usize,
    pub cities: usize,
    pub cameras: usize,
}

impl SeedReport {
    /// Whether nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

const CITIES: &[&str] = &[
    "Ahmedabad",
    "Surat",
    "Vadodara",
    "Rajkot",
    "Bhavnagar",
    "Jamnagar",
    "Junagadh",
    "Gandhinagar",
];
const BLOOD_GROUPS: &[&str] = &["A+", "B+", "AB+", "O+", "A-", "B-", "AB-", "O-"];
const VEHICLE_TYPES: &[&str] = &["Two Wheeler", "Four Wheeler", "SUV", "Truck", "Bus"];

/// Violation catalog: (id, code, category, name, fine, description).
const VIOLATIONS: &[(&str, &str, &str, &str, i64, &str)] = &[
    (
        "V001",
        "177",
        "General Offences",
        "Riding without helmet",
        1000,
        "Two-wheeler rider/pillion rider not wearing helmet",
    ),
    (
        "V002",
        "184",
        "Driving Offences",
        "Dangerous driving",
        5000,
        "Driving in a manner dangerous to the public",
    ),
];

const DISTRICTS: &[(&str, &[&str])] = &[
    ("Ahmedabad", &["Ahmedabad", "Dholera", "Sanand", "Bavla", "Dhandhuka", "Viramgam"]),
    ("Amreli", &["Amreli", "Bagasara", "Dhari", "Lathi", "Rajula", "Savarkundla"]),
    ("Anand", &["Anand", "Khambhat", "Petlad", "Sojitra", "Umreth", "Tarapur"]),
    ("Aravalli", &["Modasa", "Bayad", "Bhiloda", "Dhansura", "Malpur", "Meghraj"]),
    ("Banaskantha", &["Palanpur", "Deesa", "Dhanera", "Tharad", "Ambaji", "Danta"]),
    ("Bharuch", &["Bharuch", "Ankleshwar", "Jambusar", "Vagra", "Hansot"]),
    ("Bhavnagar", &["Bhavnagar", "Mahuva", "Palitana", "Sihor", "Gariadhar", "Talaja"]),
    ("Botad", &["Botad", "Gadhada", "Barvala", "Ranpur"]),
    ("Chhota Udaipur", &["Chhota Udaipur", "Bodeli", "Pavi Jetpur"]),
    ("Dahod", &["Dahod", "Jhalod", "Devgadh Baria", "Limkheda"]),
    ("Dang", &["Ahwa", "Saputara", "Waghai"]),
    ("Devbhoomi Dwarka", &["Dwarka", "Khambhalia", "Okha", "Bhanvad"]),
    ("Gandhinagar", &["Gandhinagar", "Kalol", "Dehgam", "Mansa"]),
    ("Gir Somnath", &["Veraval", "Somnath", "Talala", "Una", "Kodinar"]),
    ("Jamnagar", &["Jamnagar", "Dhrol", "Jamjodhpur", "Jodiya", "Kalavad"]),
    ("Junagadh", &["Junagadh", "Keshod", "Mangrol", "Manavadar", "Visavadar"]),
    ("Kheda", &["Nadiad", "Kheda", "Kapadvanj", "Mehmedabad", "Dakor"]),
    ("Kutch", &["Bhuj", "Gandhidham", "Anjar", "Mandvi", "Mundra", "Rapar"]),
    ("Mahisagar", &["Lunawada", "Balasinor", "Santrampur", "Virpur"]),
    (
        "Mehsana",
        &["Mehsana", "Visnagar", "Unjha", "Kadi", "Vadnagar", "Vijapur", "Becharaji"],
    ),
    ("Morbi", &["Morbi", "Wankaner", "Halvad", "Tankara"]),
    ("Narmada", &["Rajpipla", "Dediyapada", "Tilakwada"]),
    ("Navsari", &["Navsari", "Bilimora", "Gandevi", "Chikhli", "Vansda"]),
    ("Panchmahal", &["Godhra", "Halol", "Kalol", "Shehera"]),
    ("Patan", &["Patan", "Sidhpur", "Chanasma", "Harij", "Radhanpur"]),
    ("Porbandar", &["Porbandar", "Ranavav", "Kutiyana"]),
    ("Rajkot", &["Rajkot", "Gondal", "Jetpur", "Dhoraji", "Upleta", "Jasdan"]),
    ("Sabarkantha", &["Himmatnagar", "Idar", "Prantij", "Talod", "Khedbrahma"]),
    ("Surat", &["Surat", "Bardoli", "Vyara", "Olpad", "Mandvi", "Mangrol"]),
    (
        "Surendranagar",
        &["Surendranagar", "Wadhwan", "Dhrangadhra", "Limbdi", "Chotila"],
    ),
    ("Tapi", &["Vyara", "Songadh", "Valod", "Uchchal"]),
    ("Vadodara", &["Vadodara", "Padra", "Karjan", "Dabhoi", "Savli", "Waghodia"]),
    ("Valsad", &["Valsad", "Vapi", "Pardi", "Umbergaon", "Dharampur"]),
];

const CITY_COORDINATES: &[(&str, f64, f64)] = &[
    ("Ahmedabad", 23.0225, 72.5714),
    ("Mehsana", 23.5880, 72.3693),
    ("Visnagar", 23.6934, 72.5487),
    ("Gandhinagar", 23.2156, 72.6369),
    ("Surat", 21.1702, 72.8311),
    ("Vadodara", 22.3072, 73.1812),
];

/// Cameras: (id, name, feed URLs).
const CAMERAS: &[(&str, &str, &[&str])] = &[
    (
        "rto-main",
        "RTO Main Gate Camera",
        &[
            "https://images.unsplash.com/photo-1449965408869-eaa3f722e40d?w=800",
            "https://images.unsplash.com/photo-1502877338535-766e1452684a?w=800",
            "https://images.unsplash.com/photo-1486299267070-83823f5448dd?w=800",
        ],
    ),
    (
        "rto-highway",
        "Highway Surveillance Camera",
        &[
            "https://images.unsplash.com/photo-1568605117036-5fe5e7bab0b7?w=800",
            "https://images.unsplash.com/photo-1469854523086-cc02fe5d8800?w=800",
        ],
    ),
    (
        "rto-junction",
        "Traffic Junction Camera",
        &[
            "https://images.unsplash.com/photo-1502877338535-766e1452684a?w=800",
            "https://images.unsplash.com/photo-1449965408869-eaa3f722e40d?w=800",
        ],
    ),
    (
        "rto-toll",
        "Toll Plaza Camera",
        &[
            "https://images.unsplash.com/photo-1486299267070-83823f5448dd?w=800",
            "https://images.unsplash.com/photo-1568605117036-5fe5e7bab0b7?w=800",
        ],
    ),
];

const CAMERA_TYPE: &str = "Simulation";

/// Seed every empty reference table, in one transaction.
///
/// # Errors
///
/// Returns an error if any insert fails; nothing is committed in that case.
pub fn seed_all(conn: &Connection, options: SeedOptions) -> Result<SeedReport> {
    let tx = conn.unchecked_transaction()?;
    let mut report = SeedReport::default();

    if is_empty(&tx, "drivers")? {
        let mut rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut drivers = fixed_drivers();
        drivers.extend(generated_drivers(&mut rng, options.random_drivers));
        for driver in &drivers {
            insert_driver(&tx, driver)?;
        }
        report.drivers = drivers.len();
        info!(count = report.drivers, "Seeded drivers");
    }

    if is_empty(&tx, "violations")? {
        for (id, code, category, name, fine, description) in VIOLATIONS {
            tx.execute(
                "INSERT INTO violations (id, code, category, violation, fine, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, code, category, name, fine, description],
            )?;
        }
        report.violations = VIOLATIONS.len();
        info!(count = report.violations, "Seeded violations");
    }

    if is_empty(&tx, "districts")? {
        for (district, cities) in DISTRICTS {
            tx.execute("INSERT INTO districts (name) VALUES (?1)", [district])?;
            let district_id = tx.last_insert_rowid();
            for city in *cities {
                let coords = CITY_COORDINATES.iter().find(|(name, _, _)| name == city);
                tx.execute(
                    "INSERT INTO cities (district_id, name, latitude, longitude)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        district_id,
                        city,
                        coords.map(|c| c.1),
                        coords.map(|c| c.2)
                    ],
                )?;
                report.cities += 1;
            }
        }
        report.districts = DISTRICTS.len();
        info!(
            districts = report.districts,
            cities = report.cities,
            "Seeded location data"
        );
    }

    if is_empty(&tx, "cameras")? {
        for (id, name, feeds) in CAMERAS {
            let feeds = serde_json::to_string(feeds)?;
            tx.execute(
                "INSERT INTO cameras (id, name, type, feeds) VALUES (?1, ?2, ?3, ?4)",
                params![id, name, CAMERA_TYPE, feeds],
            )?;
        }
        report.cameras = CAMERAS.len();
        info!(count = report.cameras, "Seeded cameras");
    }

    tx.commit()?;
    Ok(report)
}

fn is_empty(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count == 0)
}

/// Insert one driver row.
pub(super) fn insert_driver(conn: &Connection, d: &Driver) -> Result<()> {
    let descriptor = d
        .face_descriptor
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        r"
        INSERT INTO drivers (
            id, name, is_driver, govt_id_type, govt_id_number, license_number,
            vehicle_number, vehicle_type, father_name, dob, blood_group,
            address, city, phone, license_expiry, photo, face_descriptor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        ",
        params![
            d.id,
            d.name,
            d.is_driver,
            d.govt_id_type,
            d.govt_id_number,
            d.license_number,
            d.vehicle_number,
            d.vehicle_type,
            d.father_name,
            d.dob,
            d.blood_group,
            d.address,
            d.city,
            d.phone,
            d.license_expiry,
            d.photo,
            descriptor,
        ],
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn fixed_driver(
    id: &str,
    name: &str,
    id_type: &str,
    id_number: &str,
    license: &str,
    vehicle: (&str, &str),
    father: &str,
    dob: &str,
    blood: &str,
    address: &str,
    city: &str,
    phone: &str,
    expiry: &str,
    photo: &str,
) -> Driver {
    Driver {
        id: id.to_string(),
        name: name.to_string(),
        is_driver: true,
        govt_id_type: id_type.to_string(),
        govt_id_number: id_number.to_string(),
        license_number: license.to_string(),
        vehicle_number: vehicle.0.to_string(),
        vehicle_type: vehicle.1.to_string(),
        father_name: father.to_string(),
        dob: dob.to_string(),
        blood_group: blood.to_string(),
        address: address.to_string(),
        city: city.to_string(),
        phone: phone.to_string(),
        license_expiry: expiry.to_string(),
        photo: photo.to_string(),
        face_descriptor: None,
    }
}

/// The three hand-written demo drivers, `GJ001`..`GJ003`.
#[must_use]
pub fn fixed_drivers() -> Vec<Driver> {
    vec![
        fixed_driver(
            "GJ001",
            "GOVIND CHAUDHARI",
            "Aadhaar",
            "5566-7788-9900",
            "GJ-0120230045678",
            ("GJ 02 AB 1234", "Two Wheeler"),
            "Ramesh Chaudhari",
            "1985-06-15",
            "O+",
            "12, Gokuldham Society, Visnagar, Gujarat",
            "Visnagar",
            "+91 96646 50787",
            "2027-08-22",
            "https://randomuser.me/api/portraits/women/44.jpg",
        ),
        fixed_driver(
            "GJ002",
            "PRAYAN CHAUDHARI",
            "Aadhaar",
            "9988-7766-5544",
            "GJ-0520200012345",
            ("GJ 05 CD 5678", "Four Wheeler"),
            "Suresh Chaudhari",
            "1990-11-23",
            "A+",
            "45, Surat Diamond Hub, Surat, Gujarat",
            "Surat",
            "+91 98980 12345",
            "2030-12-10",
            "https://randomuser.me/api/portraits/men/32.jpg",
        ),
        fixed_driver(
            "GJ003",
            "KRIS CHAUDHARY",
            "PAN",
            "ABCDE1234F",
            "GJ-0120210023456",
            ("GJ 01 EF 9012", "SUV"),
            "Mahesh Chaudhary",
            "1992-03-08",
            "B+",
            "78, Satellite Road, Ahmedabad, Gujarat",
            "Ahmedabad",
            "+91 98765 43210",
            "2025-05-20",
            "https://randomuser.me/api/portraits/men/45.jpg",
        ),
    ]
}

fn digits<R: Rng>(rng: &mut R, len: u32) -> String {
    let n = rng.gen_range(0..10u64.pow(len));
    format!("{n:0width$}", width = len as usize)
}

fn letter<R: Rng>(rng: &mut R) -> char {
    char::from(b'A' + rng.gen_range(0..26u8))
}

fn date_between<R: Rng>(rng: &mut R, start: NaiveDate, end: NaiveDate) -> String {
    let span = (end - start).num_days();
    let date = start + chrono::Duration::days(rng.gen_range(0..span));
    date.format("%Y-%m-%d").to_string()
}

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Generate `count` synthetic drivers numbered after the fixed ones.
#[must_use]
pub fn generated_drivers<R: Rng>(rng: &mut R, count: u32) -> Vec<Driver> {
    let year = Utc::now().year();
    // Literal dates are always valid; fall back to MIN only to stay total.
    let dob_range = (
        NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN),
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN),
    );
    let expiry_range = (
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or(NaiveDate::MIN),
        NaiveDate::from_ymd_opt(2035, 1, 1).unwrap_or(NaiveDate::MIN),
    );

    (1..=count)
        .map(|i| {
            let n = i + 3;
            let city = pick(rng, CITIES);
            let gender = if rng.gen_bool(0.5) { "men" } else { "women" };
            Driver {
                id: format!("GJ{n:03}"),
                name: format!("Driver {n}"),
                is_driver: true,
                govt_id_type: "Aadhaar".to_string(),
                govt_id_number: format!(
                    "{}-{}-{}",
                    digits(rng, 4),
                    digits(rng, 4),
                    digits(rng, 4)
                ),
                license_number: format!("GJ-{}{year}{}", digits(rng, 2), digits(rng, 7)),
                vehicle_number: format!(
                    "GJ {} {}{} {}",
                    digits(rng, 2),
                    letter(rng),
                    letter(rng),
                    digits(rng, 4)
                ),
                vehicle_type: pick(rng, VEHICLE_TYPES).to_string(),
                father_name: format!("Father of Driver {n}"),
                dob: date_between(rng, dob_range.0, dob_range.1),
                blood_group: pick(rng, BLOOD_GROUPS).to_string(),
                address: format!("Random Address {n}, {city}"),
                city: city.to_string(),
                phone: format!("+91 {}", rng.gen_range(9_000_000_000u64..10_000_000_000)),
                license_expiry: date_between(rng, expiry_range.0, expiry_range.1),
                photo: format!(
                    "https://randomuser.me/api/portraits/{gender}/{}.jpg",
                    rng.gen_range(0..99)
                ),
                face_descriptor: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::initialize_schema;

    fn fresh_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_seed_all_fills_every_table() {
        let conn = fresh_db();
        let report = seed_all(
            &conn,
            SeedOptions {
                random_drivers: 10,
                rng_seed: Some(1),
            },
        )
        .unwrap();

        assert_eq!(report.drivers, 13);
        assert_eq!(report.violations, 2);
        assert_eq!(report.districts, 33);
        assert_eq!(report.cameras, 4);
        assert_eq!(count(&conn, "drivers"), 13);
        assert_eq!(count(&conn, "cities") as usize, report.cities);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let conn = fresh_db();
        let options = SeedOptions {
            random_drivers: 2,
            rng_seed: Some(1),
        };
        seed_all(&conn, options).unwrap();
        let second = seed_all(&conn, options).unwrap();

        assert!(second.is_empty());
        assert_eq!(count(&conn, "drivers"), 5);
    }

    #[test]
    fn test_generated_drivers_are_reproducible() {
        let a = generated_drivers(&mut StdRng::seed_from_u64(42), 5);
        let b = generated_drivers(&mut StdRng::seed_from_u64(42), 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_driver_shape() {
        let drivers = generated_drivers(&mut StdRng::seed_from_u64(7), 3);

        assert_eq!(drivers[0].id, "GJ004");
        assert_eq!(drivers[2].id, "GJ006");
        for d in &drivers {
            assert!(CITIES.contains(&d.city.as_str()));
            assert_eq!(d.govt_id_number.len(), 14);
            assert!(d.phone.starts_with("+91 9"));
            assert!(d.face_descriptor.is_none());
            assert!(d.dob.as_str() >= "1970-01-01" && d.dob.as_str() < "2000-01-01");
        }
    }

    #[test]
    fn test_fixed_drivers() {
        let drivers = fixed_drivers();
        assert_eq!(drivers.len(), 3);
        assert_eq!(drivers[0].id, "GJ001");
        assert_eq!(drivers[0].city, "Visnagar");
    }

    #[test]
    fn test_coordinates_only_for_known_cities() {
        let conn = fresh_db();
        seed_all(&conn, SeedOptions::default()).unwrap();

        let with_coords: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT name) FROM cities WHERE latitude IS NOT NULL",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(with_coords as usize, CITY_COORDINATES.len());
    }
}
