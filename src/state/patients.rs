use crate::api::models::User;

pub const PAGE_SIZE: usize = 10;

/// One page of a client-side paginated list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: Vec<&'a T>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Case-insensitive substring match over name, email and phone.
pub fn search_patients<'a>(patients: &'a [User], query: &str) -> Vec<&'a User> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return patients.iter().collect();
    }

    patients
        .iter()
        .filter(|patient| {
            patient.full_name().to_lowercase().contains(&needle)
                || patient.email.to_lowercase().contains(&needle)
                || patient
                    .phone
                    .as_deref()
                    .is_some_and(|phone| phone.contains(&needle))
        })
        .collect()
}

/// Slices `items` into fixed-size pages. Pages outside `1..=total_pages` are empty.
pub fn paginate<'a, T>(items: &[&'a T], page: usize, page_size: usize) -> Page<'a, T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let offset = page
        .checked_sub(1)
        .and_then(|skipped| skipped.checked_mul(page_size));
    let items = match offset {
        Some(offset) => items
            .iter()
            .skip(offset)
            .take(page_size)
            .copied()
            .collect(),
        None => Vec::new(),
    };

    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: usize, first: &str, email: &str) -> User {
        User {
            id: format!("p{}", id),
            first_name: first.to_string(),
            last_name: "Test".to_string(),
            email: email.to_string(),
            phone: Some(format!("555-01{:02}", id)),
            ..Default::default()
        }
    }

    #[test]
    fn search_matches_name_email_and_phone() {
        let patients = vec![
            patient(1, "Ada", "ada@example.com"),
            patient(2, "Grace", "grace@clinic.org"),
            patient(3, "Alan", "turing@example.com"),
        ];

        assert_eq!(search_patients(&patients, "GRACE").len(), 1);
        assert_eq!(search_patients(&patients, "example").len(), 2);
        assert_eq!(search_patients(&patients, "555-0103")[0].id, "p3");
        assert_eq!(search_patients(&patients, "  ").len(), 3);
        assert!(search_patients(&patients, "nobody").is_empty());
    }

    #[test]
    fn pagination_splits_and_bounds_pages() {
        let patients: Vec<User> = (1..=23)
            .map(|i| patient(i, "P", "p@example.com"))
            .collect();
        let all: Vec<&User> = patients.iter().collect();

        let first = paginate(&all, 1, PAGE_SIZE);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 23);
        assert_eq!(first.items[0].id, "p1");

        let last = paginate(&all, 3, PAGE_SIZE);
        assert_eq!(last.items.len(), 3);
        assert_eq!(last.items[2].id, "p23");

        assert!(paginate(&all, 4, PAGE_SIZE).items.is_empty());
        assert!(paginate(&all, 0, PAGE_SIZE).items.is_empty());
    }

    #[test]
    fn huge_page_number_is_just_out_of_range() {
        let patients: Vec<User> = (1..=3).map(|i| patient(i, "P", "p@example.com")).collect();
        let all: Vec<&User> = patients.iter().collect();

        let page = paginate(&all, usize::MAX, PAGE_SIZE);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn empty_list_has_no_pages() {
        let none: Vec<&User> = Vec::new();
        let page = paginate(&none, 1, PAGE_SIZE);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
    }
}
