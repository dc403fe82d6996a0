// Static track catalog shared by the request builder and the CLI

use crate::errors::PitwallError;

use super::types::{LapRecord, OvertakingDifficulty, Track, TrackId, TrackType};

const fn lap(time: &'static str, holder: &'static str) -> LapRecord {
    LapRecord { time, holder }
}

/// Every track the prediction modules know about, ordered by id.
///
/// The position in this array is `id - 1`; `by_id` relies on it.
static TRACKS: [Track; 24] = [
    Track {
        id: TrackId(1),
        name: "Abu Dhabi",
        circuit_name: "Yas Marina Circuit",
        first_grand_prix: 2009,
        laps: 58,
        circuit_length_km: 5.281,
        race_distance_km: 306.298,
        full_throttle_pct: 63,
        longest_flat_out_m: 1233,
        lap_record: lap("1:26.103", "Max Verstappen (2021)"),
        qualifying_lap_record: lap("1:22.109", "Max Verstappen (2021)"),
        recommended_temps_c: (28, 33),
        average_speed_kph: 274.5283157,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(2),
        name: "Australia",
        circuit_name: "Albert Park Grand Prix Circuit",
        first_grand_prix: 1928,
        laps: 58,
        circuit_length_km: 5.303,
        race_distance_km: 307.574,
        full_throttle_pct: 77,
        longest_flat_out_m: 843,
        lap_record: lap("1:19.813", "Charles Leclerc (2024)"),
        qualifying_lap_record: lap("1:15.915", "Max Verstappen (2024)"),
        recommended_temps_c: (22, 36),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(3),
        name: "Austria",
        circuit_name: "Red Bull Ring",
        first_grand_prix: 1963,
        laps: 71,
        circuit_length_km: 4.318,
        race_distance_km: 306.578,
        full_throttle_pct: 79,
        longest_flat_out_m: 868,
        lap_record: lap("1:05.619", "Carlos Sainz (2020)"),
        qualifying_lap_record: lap("1:02.939", "Valtteri Bottas (2020)"),
        recommended_temps_c: (24, 37),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(4),
        name: "Azerbaijan",
        circuit_name: "Baku City Circuit",
        first_grand_prix: 2016,
        laps: 51,
        circuit_length_km: 6.003,
        race_distance_km: 306.153,
        full_throttle_pct: 77,
        longest_flat_out_m: 2010,
        lap_record: lap("1:43.009", "Charles Leclerc (2019)"),
        qualifying_lap_record: lap("1:40.203", "Charles Leclerc (2019)"),
        recommended_temps_c: (26, 44),
        average_speed_kph: 259.0738434,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(5),
        name: "Bahrain",
        circuit_name: "Bahrain International Circuit",
        first_grand_prix: 2004,
        laps: 57,
        circuit_length_km: 5.412,
        race_distance_km: 308.484,
        full_throttle_pct: 72,
        longest_flat_out_m: 1205,
        lap_record: lap("1:31.447", "Pedro de la Rosa (2005)"),
        qualifying_lap_record: lap("1:27.264", "Lewis Hamilton (2020)"),
        recommended_temps_c: (23, 27),
        average_speed_kph: 263.2997879,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Low,
    },
    Track {
        id: TrackId(6),
        name: "Belgium",
        circuit_name: "Circuit de Spa-Francorchamps",
        first_grand_prix: 1925,
        laps: 44,
        circuit_length_km: 7.004,
        race_distance_km: 308.176,
        full_throttle_pct: 75,
        longest_flat_out_m: 2015,
        lap_record: lap("1:44.701", "Sergio Perez (2024)"),
        qualifying_lap_record: lap("1:41.252", "Lewis Hamilton (2020)"),
        recommended_temps_c: (20, 36),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(7),
        name: "Brazil",
        circuit_name: "Autodromo Jose Carlos Pace (Interlagos)",
        first_grand_prix: 1973,
        laps: 71,
        circuit_length_km: 4.309,
        race_distance_km: 305.939,
        full_throttle_pct: 64,
        longest_flat_out_m: 1394,
        lap_record: lap("1:10.540", "Valtteri Bottas (2018)"),
        qualifying_lap_record: lap("1:07.281", "Lewis Hamilton (2018)"),
        recommended_temps_c: (22, 39),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(8),
        name: "Canada",
        circuit_name: "Circuit Gilles Villeneuve",
        first_grand_prix: 1967,
        laps: 70,
        circuit_length_km: 4.361,
        race_distance_km: 305.27,
        full_throttle_pct: 76,
        longest_flat_out_m: 1190,
        lap_record: lap("1:13.078", "Valtteri Bottas (2019)"),
        qualifying_lap_record: lap("1:10.240", "Sebastian Vettel (2019)"),
        recommended_temps_c: (19, 34),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(9),
        name: "China",
        circuit_name: "Shanghai International Circuit",
        first_grand_prix: 2004,
        laps: 56,
        circuit_length_km: 5.451,
        race_distance_km: 305.256,
        full_throttle_pct: 70,
        longest_flat_out_m: 1202,
        lap_record: lap("1:32.238", "Michael Schumacher (2004)"),
        qualifying_lap_record: lap("1:31.095", "Valtteri Bottas (2018)"),
        recommended_temps_c: (19, 30),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(10),
        name: "Great Britain",
        circuit_name: "Silverstone Circuit",
        first_grand_prix: 1950,
        laps: 52,
        circuit_length_km: 5.891,
        race_distance_km: 306.332,
        full_throttle_pct: 70,
        longest_flat_out_m: 1034,
        lap_record: lap("1:27.097", "Max Verstappen (2020)"),
        qualifying_lap_record: lap("1:24.303", "Lewis Hamilton (2020)"),
        recommended_temps_c: (19, 30),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(11),
        name: "Hungary",
        circuit_name: "Hungaroring",
        first_grand_prix: 1986,
        laps: 70,
        circuit_length_km: 4.381,
        race_distance_km: 306.67,
        full_throttle_pct: 50,
        longest_flat_out_m: 908,
        lap_record: lap("1:16.627", "Lewis Hamilton (2020)"),
        qualifying_lap_record: lap("1:13.447", "Lewis Hamilton (2020)"),
        recommended_temps_c: (26, 40),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(12),
        name: "Imola",
        circuit_name: "Autodromo Internazionale Enzo e Dino Ferrari",
        first_grand_prix: 1980,
        laps: 63,
        circuit_length_km: 4.909,
        race_distance_km: 309.267,
        full_throttle_pct: 67,
        longest_flat_out_m: 877,
        lap_record: lap("1:15.484", "Lewis Hamilton (2020)"),
        qualifying_lap_record: lap("1:13.609", "Valtteri Bottas (2020)"),
        recommended_temps_c: (19, 30),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(13),
        name: "Italy",
        circuit_name: "Autodromo Nazionale Monza",
        first_grand_prix: 1950,
        laps: 53,
        circuit_length_km: 5.793,
        race_distance_km: 307.029,
        full_throttle_pct: 84,
        longest_flat_out_m: 1520,
        lap_record: lap("1:21.046", "Rubens Barrichello (2004)"),
        qualifying_lap_record: lap("1:18.887", "Lewis Hamilton (2020)"),
        recommended_temps_c: (30, 45),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(14),
        name: "Japan",
        circuit_name: "Suzuka Circuit",
        first_grand_prix: 1963,
        laps: 53,
        circuit_length_km: 5.807,
        race_distance_km: 307.771,
        full_throttle_pct: 65,
        longest_flat_out_m: 1315,
        lap_record: lap("1:30.983", "Lewis Hamilton (2019)"),
        qualifying_lap_record: lap("1:27.064", "Sebastian Vettel (2019)"),
        recommended_temps_c: (22, 33),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(15),
        name: "Las Vegas",
        circuit_name: "Las Vegas Street Circuit",
        first_grand_prix: 2023,
        laps: 50,
        circuit_length_km: 6.201,
        race_distance_km: 310.05,
        full_throttle_pct: 74,
        longest_flat_out_m: 1800,
        lap_record: lap("1:35.490", "Oscar Piastri (2023)"),
        qualifying_lap_record: lap("1:32.726", "Charles Leclerc (2023)"),
        recommended_temps_c: (18, 18),
        average_speed_kph: 239.0699816,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(16),
        name: "Mexico",
        circuit_name: "Autodromo Hermanos Rodriguez",
        first_grand_prix: 1963,
        laps: 71,
        circuit_length_km: 4.304,
        race_distance_km: 305.584,
        full_throttle_pct: 45,
        longest_flat_out_m: 1200,
        lap_record: lap("1:17.774", "Valtteri Bottas (2021)"),
        qualifying_lap_record: lap("1:14.758", "Max Verstappen (2019)"),
        recommended_temps_c: (23, 41),
        average_speed_kph: 280.6934188,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(17),
        name: "Miami",
        circuit_name: "Miami International Autodrome",
        first_grand_prix: 2022,
        laps: 57,
        circuit_length_km: 5.412,
        race_distance_km: 308.484,
        full_throttle_pct: 76,
        longest_flat_out_m: 1255,
        lap_record: lap("1:29.708", "Max Verstappen (2023)"),
        qualifying_lap_record: lap("1:26.841", "Sergio Perez (2023)"),
        recommended_temps_c: (29, 41),
        average_speed_kph: 235.5888109,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(18),
        name: "Monaco",
        circuit_name: "Circuit de Monaco",
        first_grand_prix: 1929,
        laps: 78,
        circuit_length_km: 3.337,
        race_distance_km: 260.286,
        full_throttle_pct: 34,
        longest_flat_out_m: 660,
        lap_record: lap("1:12.909", "Lewis Hamilton (2021)"),
        qualifying_lap_record: lap("1:10.166", "Lewis Hamilton (2019)"),
        recommended_temps_c: (22, 43),
        average_speed_kph: 219.7982475,
        track_type: TrackType::MediumSpeed,
        overtaking_difficulty: OvertakingDifficulty::High,
    },
    Track {
        id: TrackId(19),
        name: "Netherlands",
        circuit_name: "Circuit Zandvoort",
        first_grand_prix: 1952,
        laps: 72,
        circuit_length_km: 4.259,
        race_distance_km: 306.648,
        full_throttle_pct: 59,
        longest_flat_out_m: 678,
        lap_record: lap("1:11.097", "Lewis Hamilton (2021)"),
        qualifying_lap_record: lap("1:08.885", "Max Verstappen (2021)"),
        recommended_temps_c: (20, 31),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(20),
        name: "Qatar",
        circuit_name: "Lusail International Circuit",
        first_grand_prix: 2021,
        laps: 57,
        circuit_length_km: 5.419,
        race_distance_km: 308.883,
        full_throttle_pct: 68,
        longest_flat_out_m: 1180,
        lap_record: lap("1:24.319", "Max Verstappen (2023)"),
        qualifying_lap_record: lap("1:20.827", "Lewis Hamilton (2021)"),
        recommended_temps_c: (26, 31),
        average_speed_kph: 261.351997,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Low,
    },
    Track {
        id: TrackId(21),
        name: "Saudi Arabia",
        circuit_name: "Jeddah Corniche Circuit",
        first_grand_prix: 2021,
        laps: 50,
        circuit_length_km: 6.175,
        race_distance_km: 308.75,
        full_throttle_pct: 79,
        longest_flat_out_m: 1550,
        lap_record: lap("1:30.734", "Lewis Hamilton (2021)"),
        qualifying_lap_record: lap("1:27.472", "Max Verstappen (2024)"),
        recommended_temps_c: (26, 31),
        average_speed_kph: 280.598438,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(22),
        name: "Singapore",
        circuit_name: "Marina Bay Street Circuit",
        first_grand_prix: 2008,
        laps: 61,
        circuit_length_km: 4.94,
        race_distance_km: 301.34,
        full_throttle_pct: 49,
        longest_flat_out_m: 832,
        lap_record: lap("1:34.486", "Daniel Ricciardo (2024)"),
        qualifying_lap_record: lap("1:29.525", "Lando Norris (2024)"),
        recommended_temps_c: (29, 34),
        average_speed_kph: 271.4267409,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::High,
    },
    Track {
        id: TrackId(23),
        name: "Spain",
        circuit_name: "Circuit de Barcelona-Catalunya",
        first_grand_prix: 1951,
        laps: 66,
        circuit_length_km: 4.657,
        race_distance_km: 307.362,
        full_throttle_pct: 61,
        longest_flat_out_m: 1192,
        lap_record: lap("1:16.330", "Max Verstappen (2023)"),
        qualifying_lap_record: lap("1:11.383", "Lando Norris (2024)"),
        recommended_temps_c: (27, 41),
        average_speed_kph: 259.9952934,
        track_type: TrackType::HighSpeed,
        overtaking_difficulty: OvertakingDifficulty::Medium,
    },
    Track {
        id: TrackId(24),
        name: "United States",
        circuit_name: "Circuit of the Americas",
        first_grand_prix: 2012,
        laps: 56,
        circuit_length_km: 5.513,
        race_distance_km: 308.728,
        full_throttle_pct: 59,
        longest_flat_out_m: 1090,
        lap_record: lap("1:36.169", "Charles Leclerc (2019)"),
        qualifying_lap_record: lap("1:32.029", "Valtteri Bottas (2019)"),
        recommended_temps_c: (29, 41),
        average_speed_kph: 213.3495528,
        track_type: TrackType::MediumSpeed,
        overtaking_difficulty: OvertakingDifficulty::Low,
    },
];

/// All tracks, ordered by id
pub fn all() -> &'static [Track] {
    &TRACKS
}

pub fn by_id(id: u8) -> Option<&'static Track> {
    if id == 0 {
        return None;
    }
    TRACKS.get(usize::from(id) - 1)
}

/// Resolve a display name to its track. Matching ignores case and surrounding whitespace.
pub fn by_name(name: &str) -> Result<&'static Track, PitwallError> {
    let wanted = name.trim();
    TRACKS
        .iter()
        .find(|track| track.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| PitwallError::UnknownTrack {
            name: name.to_string(),
        })
}

pub fn get(id: TrackId) -> &'static Track {
    // TrackId values are only minted from this table
    &TRACKS[usize::from(id.get()) - 1]
}
