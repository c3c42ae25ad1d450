// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canonical model-name ordering.
//
// Model lists are ordered so that embedded numbers compare numerically
// ("LaserJet 99" before "LaserJet 1200") and casing is ignored.  The fuzzy
// matcher's neighbour heuristic is tuned against exactly this ordering, so
// it must stay consistent with the sorting used for model listings.

use std::cmp::Ordering;

/// Compare two model names: case-insensitive, digit runs numeric.
pub fn model_cmp(a: &str, b: &str) -> Ordering {
    let av: Vec<char> = a.to_lowercase().chars().collect();
    let bv: Vec<char> = b.to_lowercase().chars().collect();
    let (mut i, mut j) = (0, 0);
    while i < av.len() && j < bv.len() {
        if av[i].is_ascii_digit() && bv[j].is_ascii_digit() {
            let si = i;
            while i < av.len() && av[i].is_ascii_digit() {
                i += 1;
            }
            let sj = j;
            while j < bv.len() && bv[j].is_ascii_digit() {
                j += 1;
            }
            let da = strip_leading_zeros(&av[si..i]);
            let db = strip_leading_zeros(&bv[sj..j]);
            let ord = da.len().cmp(&db.len()).then_with(|| da.cmp(db));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = av[i].cmp(&bv[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }
    (av.len() - i).cmp(&(bv.len() - j))
}

fn strip_leading_zeros(digits: &[char]) -> &[char] {
    let zeros = digits.iter().take_while(|c| **c == '0').count();
    if zeros == digits.len() {
        // All zeros: keep one so "000" == "0".
        &digits[digits.len() - 1..]
    } else {
        &digits[zeros..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_runs_compare_numerically() {
        assert_eq!(model_cmp("LaserJet 99", "LaserJet 1200"), Ordering::Less);
        assert_eq!(model_cmp("psc 2210", "psc 950"), Ordering::Greater);
    }

    #[test]
    fn comparison_is_case_insensitive() {
        assert_eq!(model_cmp("DeskJet 990C", "deskjet 990c"), Ordering::Equal);
    }

    #[test]
    fn leading_zeros_do_not_matter() {
        assert_eq!(model_cmp("fs 0600", "fs 600"), Ordering::Equal);
    }

    #[test]
    fn shorter_string_sorts_first_on_tie() {
        assert_eq!(model_cmp("stylus d 68", "stylus d 68 x"), Ordering::Less);
    }

    #[test]
    fn sorting_a_model_list() {
        let mut models = vec!["psc 2210", "psc 950", "deskjet 990", "psc 2100"];
        models.sort_by(|a, b| model_cmp(a, b));
        assert_eq!(
            models,
            vec!["deskjet 990", "psc 950", "psc 2100", "psc 2210"]
        );
    }
}
