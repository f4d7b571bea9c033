pub mod neb;
pub mod poscar;

pub use neb::{IMAGES_KEY, count_neb_images};
pub use poscar::{PoscarSpecies, locate_poscar, read_poscar_file, read_poscar_species};
